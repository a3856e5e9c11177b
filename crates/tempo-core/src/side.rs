//! Player sides and per-side storage

use std::fmt;

/// One of the two competing players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// The side that moves after this one.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Both sides, white first.
    pub const BOTH: [Side; 2] = [Side::White, Side::Black];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// A pair of values, one per side.
///
/// Remaining time, move counters, and delay state all come in white/black
/// pairs; this keeps the indexing in one place instead of twin fields
/// scattered through the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerSide<T> {
    pub white: T,
    pub black: T,
}

impl<T> PerSide<T> {
    pub fn new(white: T, black: T) -> Self {
        PerSide { white, black }
    }

    #[inline]
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    #[inline]
    pub fn set(&mut self, side: Side, value: T) {
        *self.get_mut(side) = value;
    }
}

impl<T: Clone> PerSide<T> {
    /// Both slots initialized to the same value.
    pub fn splat(value: T) -> Self {
        PerSide {
            white: value.clone(),
            black: value,
        }
    }
}

impl<T: Copy> PerSide<T> {
    #[inline]
    pub fn copied(&self, side: Side) -> T {
        *self.get(side)
    }
}

impl<T> std::ops::Index<Side> for PerSide<T> {
    type Output = T;

    #[inline]
    fn index(&self, side: Side) -> &T {
        self.get(side)
    }
}

impl<T> std::ops::IndexMut<Side> for PerSide<T> {
    #[inline]
    fn index_mut(&mut self, side: Side) -> &mut T {
        self.get_mut(side)
    }
}
