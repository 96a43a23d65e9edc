//! The dt_strand crate.
//!
//! Provides the strand-level representations of the DNA tube simulation:
//!  - the base alphabet (A, C, G, T and the gap symbol),
//!  - validation and complementation of strands,
//!  - `Dna`, a single- or double-stranded molecule with aligned strands.
//!

mod error;
mod alphabet;
mod dna;

pub use error::*;
pub use alphabet::*;
pub use dna::*;

