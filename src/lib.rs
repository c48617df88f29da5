pub mod error;
pub mod npy;
pub mod grid;
pub mod instruction;
pub mod program;
pub mod interpreter;
pub mod search;
pub mod metrics;
pub mod logging;
