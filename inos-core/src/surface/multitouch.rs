//! Two-target simultaneous touch check.

/// Which of the two targets was touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Passes once both targets have been touched together three times, each
/// pair landing left then right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultitouchPairs {
    touches: Vec<Side>,
}

impl MultitouchPairs {
    pub const REQUIRED_PAIRS: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a touch. Returns whether the check has passed.
    pub fn touch(&mut self, side: Side) -> bool {
        self.touches.push(side);
        self.is_passed()
    }

    pub fn pairs(&self) -> usize {
        self.touches.len() / 2
    }

    pub fn is_passed(&self) -> bool {
        self.touches.len() == Self::REQUIRED_PAIRS * 2
            && self.touches.chunks(2).all(|pair| pair == [Side::Left, Side::Right])
    }
}
