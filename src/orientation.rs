//! Read pair orientation with respect to the two breakpoint axes
//!

use std::fmt;

use strum::{EnumCount, EnumIter};

/// Direction in which one end of a read pair points along its reference axis
///
/// `Up` means the read points toward increasing coordinates, so the breakpoint it supports is
/// expected at a higher coordinate than the read itself. `Down` is the reverse.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum AxisDirection {
    Up,
    Down,
}

impl AxisDirection {
    pub fn sign(self) -> i64 {
        match self {
            AxisDirection::Up => 1,
            AxisDirection::Down => -1,
        }
    }

    /// Apply the direction sign to a coordinate
    ///
    /// This transform is its own inverse.
    ///
    pub fn apply(self, v: i64) -> i64 {
        self.sign() * v
    }

    pub fn reverse(self) -> Self {
        match self {
            AxisDirection::Up => AxisDirection::Down,
            AxisDirection::Down => AxisDirection::Up,
        }
    }

    fn label(self) -> char {
        match self {
            AxisDirection::Up => 'U',
            AxisDirection::Down => 'D',
        }
    }
}

/// Orientation of a read pair, as the direction of the read on the x axis followed by the
/// direction of its mate on the y axis
///
/// The anti-diagonal breakpoint coordinate for any orientation is `r = x(x) + y(y)`, where the
/// axis transforms apply each direction's sign. With this transform, moving the breakpoint away
/// from either read always increases r.
///
#[derive(
    Clone, Copy, Debug, EnumCount, EnumIter, Eq, Hash, PartialEq, PartialOrd, Ord,
)]
pub enum Orientation {
    UpUp,
    UpDown,
    DownUp,
    DownDown,
}

impl Orientation {
    pub fn from_directions(x_dir: AxisDirection, y_dir: AxisDirection) -> Self {
        use AxisDirection::*;
        match (x_dir, y_dir) {
            (Up, Up) => Orientation::UpUp,
            (Up, Down) => Orientation::UpDown,
            (Down, Up) => Orientation::DownUp,
            (Down, Down) => Orientation::DownDown,
        }
    }

    pub fn x_dir(self) -> AxisDirection {
        match self {
            Orientation::UpUp | Orientation::UpDown => AxisDirection::Up,
            Orientation::DownUp | Orientation::DownDown => AxisDirection::Down,
        }
    }

    pub fn y_dir(self) -> AxisDirection {
        match self {
            Orientation::UpUp | Orientation::DownUp => AxisDirection::Up,
            Orientation::UpDown | Orientation::DownDown => AxisDirection::Down,
        }
    }

    /// Transform an x axis coordinate
    pub fn x(self, v: i64) -> i64 {
        self.x_dir().apply(v)
    }

    /// Transform a y axis coordinate
    pub fn y(self, v: i64) -> i64 {
        self.y_dir().apply(v)
    }

    /// Anti-diagonal coordinate of the point (x,y)
    pub fn r(self, x: i64, y: i64) -> i64 {
        self.x(x) + self.y(y)
    }

    /// Orientation of the same read pair seen from the mate's perspective
    ///
    pub fn flip(self) -> Self {
        Self::from_directions(self.y_dir(), self.x_dir())
    }

    /// True for the two orientations where the reads of a pair point toward each other
    ///
    pub fn is_inward_facing(self) -> bool {
        matches!(self, Orientation::UpDown | Orientation::DownUp)
    }

    pub fn label(self) -> String {
        [self.x_dir().label(), self.y_dir().label()].iter().collect()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
