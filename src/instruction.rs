use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::InvalidInstruction;

/// Robot heading. Turning right adds one, turning left subtracts one,
/// both modulo four.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline]
    pub fn from_ordinal(n: u8) -> Self {
        Self::ALL[(n % 4) as usize]
    }

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn right(self) -> Self {
        Self::from_ordinal(self.ordinal() + 1)
    }

    #[inline]
    pub fn left(self) -> Self {
        Self::from_ordinal(self.ordinal() + 3)
    }

    /// One cell of movement in this heading. North decreases `y`.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

/// One instruction of the robot language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instruction {
    Forward,
    Backward,
    RotateLeft,
    RotateRight,
    CallSub1,
    CallSub2,
}

impl Instruction {
    /// The vocabulary in the order the search enumerates it.
    pub const VOCABULARY: [Instruction; 6] = [
        Instruction::Forward,
        Instruction::Backward,
        Instruction::RotateLeft,
        Instruction::RotateRight,
        Instruction::CallSub1,
        Instruction::CallSub2,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Instruction::Forward => "forward",
            Instruction::Backward => "backward",
            Instruction::RotateLeft => "left",
            Instruction::RotateRight => "right",
            Instruction::CallSub1 => "f1",
            Instruction::CallSub2 => "f2",
        }
    }
}

impl FromStr for Instruction {
    type Err = InvalidInstruction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::VOCABULARY
            .into_iter()
            .find(|i| i.tag() == s)
            .ok_or_else(|| InvalidInstruction { tag: s.to_string() })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_rights_restore_heading() {
        for d in Direction::ALL {
            assert_eq!(d.right().right().right().right(), d);
        }
    }

    #[test]
    fn test_left_inverts_right() {
        for d in Direction::ALL {
            assert_eq!(d.right().left(), d);
            assert_eq!(d.left().right(), d);
        }
    }

    #[test]
    fn test_rotation_wraps() {
        assert_eq!(Direction::West.right(), Direction::North);
        assert_eq!(Direction::North.left(), Direction::West);
        assert_eq!(Direction::East.right(), Direction::South);
    }

    #[test]
    fn test_deltas() {
        assert_eq!(Direction::North.delta(), (0, -1));
        assert_eq!(Direction::East.delta(), (1, 0));
        assert_eq!(Direction::South.delta(), (0, 1));
        assert_eq!(Direction::West.delta(), (-1, 0));
    }

    #[test]
    fn test_tags_parse_back() {
        for i in Instruction::VOCABULARY {
            assert_eq!(i.tag().parse::<Instruction>(), Ok(i));
        }
    }

    #[test]
    fn test_unknown_tag() {
        let err = "jump".parse::<Instruction>().unwrap_err();
        assert_eq!(err.tag, "jump");
        assert!(err.to_string().contains("jump"));
    }

    #[test]
    fn test_serialize_as_tag() {
        let json = serde_json::to_string(&[Instruction::CallSub1, Instruction::RotateLeft]).unwrap();
        assert_eq!(json, r#"["f1","left"]"#);
    }
}
