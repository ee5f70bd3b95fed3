/// Why a byte sequence could not be taken as a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The byte at `offset` should have been the sentinel.
    MissingSentinel { offset: usize, found: u8 },
    InvalidLength { expected: usize, actual: usize },
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::MissingSentinel { offset, found } => {
                write!(f, "expected sentinel at offset {offset}, found {found:#04X}")
            }
            FrameError::InvalidLength { expected, actual } => {
                write!(f, "expected {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for FrameError {}
