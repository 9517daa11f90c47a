use core::fmt;

/// Caller contract violations caught by the checked entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HarnessError {
    ZeroCapacity,
    CapacityTooSmall { required: usize, capacity: usize },
    CapacityExceedsCeiling { capacity: usize, ceiling: usize },
    NullSource,
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::ZeroCapacity => write!(f, "output capacity must be non-zero"),
            HarnessError::CapacityTooSmall { required, capacity } => write!(
                f,
                "generated code needs {} bytes but the output holds {}",
                required, capacity
            ),
            HarnessError::CapacityExceedsCeiling { capacity, ceiling } => write!(
                f,
                "output capacity {} exceeds the {} byte ceiling",
                capacity, ceiling
            ),
            HarnessError::NullSource => write!(f, "source pointer is null"),
        }
    }
}

impl core::error::Error for HarnessError {}
