//! Dead pixel colour sequence.

use std::fmt;

/// Full-screen colours shown in turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadpixelColor {
    Red,
    Green,
    Blue,
    Black,
    White,
}

impl DeadpixelColor {
    pub const SEQUENCE: [DeadpixelColor; 5] =
        [Self::Red, Self::Green, Self::Blue, Self::Black, Self::White];
}

impl fmt::Display for DeadpixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Black => "black",
            Self::White => "white",
        };
        f.write_str(name)
    }
}

/// Steps through [`DeadpixelColor::SEQUENCE`]; passes after the last colour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadpixelSequence {
    index: usize,
}

impl DeadpixelSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> DeadpixelColor {
        DeadpixelColor::SEQUENCE[self.index.min(DeadpixelColor::SEQUENCE.len() - 1)]
    }

    /// Move to the next colour. Returns true once the sequence is done.
    pub fn advance(&mut self) -> bool {
        if self.index < DeadpixelColor::SEQUENCE.len() {
            self.index += 1;
        }
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.index >= DeadpixelColor::SEQUENCE.len()
    }
}
