use std::fmt;

use serde::Serialize;

use crate::error::InvalidInstruction;
use crate::instruction::Instruction;

/// Which instruction sequence of a [`Program`] is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Routine {
    Main,
    Sub1,
    Sub2,
}

/// A robot program: an entry sequence and two callable subroutines.
///
/// `sub1` and `sub2` may call themselves and each other; nothing limits
/// the call depth except the interpreter's step budget.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Program {
    pub main: Vec<Instruction>,
    pub sub1: Vec<Instruction>,
    pub sub2: Vec<Instruction>,
}

impl Program {
    pub fn new(main: Vec<Instruction>, sub1: Vec<Instruction>, sub2: Vec<Instruction>) -> Self {
        Self { main, sub1, sub2 }
    }

    /// Build a program from instruction tags (`forward`, `left`, `f1`, ...).
    pub fn from_tags<S: AsRef<str>>(
        main: &[S],
        sub1: &[S],
        sub2: &[S],
    ) -> Result<Self, InvalidInstruction> {
        Ok(Self {
            main: parse_tags(main)?,
            sub1: parse_tags(sub1)?,
            sub2: parse_tags(sub2)?,
        })
    }

    pub fn body(&self, routine: Routine) -> &[Instruction] {
        match routine {
            Routine::Main => &self.main,
            Routine::Sub1 => &self.sub1,
            Routine::Sub2 => &self.sub2,
        }
    }
}

fn parse_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<Instruction>, InvalidInstruction> {
    tags.iter().map(|t| t.as_ref().trim().parse()).collect()
}

/// Space-separated tags, e.g. `forward left f2`.
pub fn format_sequence(seq: &[Instruction]) -> String {
    seq.iter().map(|i| i.tag()).collect::<Vec<_>>().join(" ")
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "main=[{}] f1=[{}] f2=[{}]",
            format_sequence(&self.main),
            format_sequence(&self.sub1),
            format_sequence(&self.sub2)
        )
    }
}
