use std::ops::ControlFlow;

use serde::Serialize;
use tracing::trace;

use crate::grid::{Cell, GridMap};
use crate::instruction::{Direction, Instruction};
use crate::program::{Program, Routine};

/// Bottom-left corner.
pub const START: Cell = Cell::new(0, 19);
/// Top-right corner.
pub const GOAL: Cell = Cell::new(19, 0);
pub const START_HEADING: Direction = Direction::East;
pub const DEFAULT_MAX_STEPS: usize = 1000;

/// Fixed parameters of one run.
#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    pub start: Cell,
    pub heading: Direction,
    pub goal: Cell,
    /// An instruction is refused once the step counter is above this.
    pub max_steps: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start: START,
            heading: START_HEADING,
            goal: GOAL,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    /// The goal was entered after `steps` moves.
    Success { steps: usize },
    /// The step counter went past the budget before the goal was reached.
    BudgetExceeded,
    /// `main` finished without reaching the goal.
    Exhausted,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Robot state for a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunState {
    pub position: Cell,
    pub direction: Direction,
    pub steps: usize,
}

/// Subroutine entries made since the step counter last changed.
///
/// Entering a subroutine that is already active, with the same heading and
/// the same step count, repeats the robot state exactly: the nested call
/// will reach the same point again without ever moving.
struct EntryMarks {
    at_step: usize,
    active: [[bool; 4]; 2],
}

impl EntryMarks {
    fn new() -> Self {
        Self {
            at_step: 0,
            active: [[false; 4]; 2],
        }
    }

    fn slot(routine: Routine) -> usize {
        match routine {
            Routine::Sub1 => 0,
            Routine::Sub2 => 1,
            Routine::Main => unreachable!("main is never called"),
        }
    }

    /// Record an entry. Returns false if the same entry is already active.
    fn enter(&mut self, routine: Routine, direction: Direction, steps: usize) -> bool {
        if steps != self.at_step {
            self.at_step = steps;
            self.active = [[false; 4]; 2];
        }
        let mark = &mut self.active[Self::slot(routine)][direction.ordinal() as usize];
        !std::mem::replace(mark, true)
    }

    fn leave(&mut self, frame: &Frame, steps: usize) {
        if frame.steps == steps && steps == self.at_step {
            self.active[Self::slot(frame.routine)][frame.direction.ordinal() as usize] = false;
        }
    }
}

/// One active routine: where it resumes and the state it was entered with.
#[derive(Clone, Copy, Debug)]
struct Frame {
    routine: Routine,
    pc: usize,
    direction: Direction,
    steps: usize,
}

/// Executes one [`Program`] against a [`GridMap`].
///
/// Calls push a frame onto a heap-allocated stack, so call depth is
/// bounded by the step budget alone and never by the native stack. Moves and
/// calls return `ControlFlow<Outcome>`; a `Break` ends the run on the spot,
/// abandoning every active frame.
pub struct Interpreter<'a> {
    program: &'a Program,
    grid: &'a GridMap,
    config: RunConfig,
    state: RunState,
    marks: EntryMarks,
    path: Option<Vec<Cell>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program, grid: &'a GridMap, config: RunConfig) -> Self {
        Self {
            program,
            grid,
            config,
            state: RunState {
                position: config.start,
                direction: config.heading,
                steps: 0,
            },
            marks: EntryMarks::new(),
            path: None,
        }
    }

    /// Record the position after every move; read it back with [`Interpreter::path`].
    pub fn record_path(mut self) -> Self {
        self.path = Some(vec![self.config.start]);
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn path(&self) -> Option<&[Cell]> {
        self.path.as_deref()
    }

    /// Run `main` to completion. Call once per interpreter.
    pub fn execute(&mut self) -> Outcome {
        trace!(steps = 0, x = self.state.position.x, y = self.state.position.y, "start");
        let program = self.program;
        let mut frames = vec![Frame {
            routine: Routine::Main,
            pc: 0,
            direction: self.state.direction,
            steps: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            let Some(&instr) = program.body(frame.routine).get(frame.pc) else {
                let finished = *frame;
                frames.pop();
                if finished.routine != Routine::Main {
                    self.marks.leave(&finished, self.state.steps);
                }
                continue;
            };
            frame.pc += 1;
            if let ControlFlow::Break(outcome) = self.exec(instr, &mut frames) {
                return outcome;
            }
        }
        Outcome::Exhausted
    }

    fn exec(&mut self, instr: Instruction, frames: &mut Vec<Frame>) -> ControlFlow<Outcome> {
        if self.state.steps > self.config.max_steps {
            return ControlFlow::Break(Outcome::BudgetExceeded);
        }
        match instr {
            Instruction::Forward => self.step(1),
            Instruction::Backward => self.step(-1),
            Instruction::RotateLeft => {
                self.state.direction = self.state.direction.left();
                ControlFlow::Continue(())
            }
            Instruction::RotateRight => {
                self.state.direction = self.state.direction.right();
                ControlFlow::Continue(())
            }
            Instruction::CallSub1 => self.call(Routine::Sub1, frames),
            Instruction::CallSub2 => self.call(Routine::Sub2, frames),
        }
    }

    fn call(&mut self, routine: Routine, frames: &mut Vec<Frame>) -> ControlFlow<Outcome> {
        let RunState { direction, steps, .. } = self.state;
        if !self.marks.enter(routine, direction, steps) {
            // The budget can never be reached from here; report the outcome
            // an unbounded walk would eventually have produced.
            trace!(?routine, steps, "recursion without progress");
            return ControlFlow::Break(Outcome::BudgetExceeded);
        }
        frames.push(Frame {
            routine,
            pc: 0,
            direction,
            steps,
        });
        ControlFlow::Continue(())
    }

    /// Move one cell along the heading (`len = 1`) or against it (`len = -1`).
    /// Walls and the map edge absorb the move; the step is counted anyway.
    fn step(&mut self, len: isize) -> ControlFlow<Outcome> {
        let RunState { position, direction, .. } = self.state;
        let (dx, dy) = direction.delta();
        let nx = position.x as isize + dx * len;
        let ny = position.y as isize + dy * len;

        if GridMap::contains(position.x as isize, position.y as isize)
            && GridMap::contains(nx, ny)
        {
            let next = Cell::new(nx as usize, ny as usize);
            if self.grid.passable(next) {
                self.state.position = next;
            }
        }
        self.state.steps += 1;

        let position = self.state.position;
        trace!(steps = self.state.steps, x = position.x, y = position.y, "move");
        if let Some(path) = self.path.as_mut() {
            path.push(position);
        }

        if position == self.config.goal {
            return ControlFlow::Break(Outcome::Success {
                steps: self.state.steps,
            });
        }
        ControlFlow::Continue(())
    }
}

/// Run `program` from a fresh state and return how it ended.
pub fn run(program: &Program, grid: &GridMap, config: RunConfig) -> Outcome {
    Interpreter::new(program, grid, config).execute()
}
