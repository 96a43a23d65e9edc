use std::fmt;
use std::error;

/// Error type for strand construction and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrandError {
    /// A character outside of {A, C, G, T, gap}.
    InvalidBase(char),

    /// Main and opposite strand are not aligned.
    LengthMismatch { main: usize, opposite: usize },

    /// Two bases facing each other do not form a Watson-Crick pair.
    ComplementMismatch { index: usize, main: char, opposite: char },
}

impl fmt::Display for StrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase(c) => write!(f, "Invalid base in sequence: '{c}'"),
            Self::LengthMismatch { main, opposite } => write!(f, 
                "Invalid opposite: main strand has length {main}, opposite has length {opposite}"),
            Self::ComplementMismatch { index, main, opposite } => write!(f, 
                "Invalid opposite: '{main}' does not pair with '{opposite}' at position {index}"),
        }
    }
}

impl error::Error for StrandError {}

