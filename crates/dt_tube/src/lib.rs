//! The dt_tube crate.
//!
//! Simulates a reaction vessel holding a population of DNA molecules
//! (see `dt_strand::Dna`) and the lab operations applied to it:
//!  - bead filtering and PCR amplification (with random failure),
//!  - heat separation, restriction cleavage and annealing ("cooling"),
//!  - mixing tubes, pouring duplicates and gel-style length sorting.
//!

mod failure;
mod tube;

pub use failure::*;
pub use tube::*;

pub use dt_strand::Dna;
pub use dt_strand::StrandError;

