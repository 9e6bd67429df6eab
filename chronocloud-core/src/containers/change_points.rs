use std::fmt::Display;

use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The capture a change point originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Epoch {
    First,
    Second,
}

impl Epoch {
    /// Maps the 1-based epoch number used in change point files to an `Epoch`
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Epoch::First),
            2 => Some(Epoch::Second),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Epoch::First => 1,
            Epoch::Second => 2,
        }
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "epoch {}", self.number())
    }
}

/// A point of significant change between two epochs. `magnitude` is the signed displacement computed
/// upstream, `epoch` the capture the position was sampled from
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChangePoint {
    pub position: Vector3<f64>,
    pub magnitude: f64,
    pub epoch: Epoch,
}

impl ChangePoint {
    pub fn new(position: Vector3<f64>, magnitude: f64, epoch: Epoch) -> Self {
        Self {
            position,
            magnitude,
            epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_numbers() {
        assert_eq!(Epoch::from_number(1), Some(Epoch::First));
        assert_eq!(Epoch::from_number(2), Some(Epoch::Second));
        assert_eq!(Epoch::from_number(0), None);
        assert_eq!(Epoch::Second.number(), 2);
    }
}
