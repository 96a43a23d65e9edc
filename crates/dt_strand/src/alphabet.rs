//! Base alphabet, strand validation and complementation.
//!
//! Strands are plain ASCII strings over {A, C, G, T} plus the gap symbol
//! `GAP`, which marks a column without a base (e.g. a sticky end).
//! Complementation is an involution: A <-> T, C <-> G, gap <-> gap.
//!

use crate::StrandError;

/// The unpaired / empty column marker.
pub const GAP: char = ' ';

/// Return the Watson-Crick partner of a base (gap maps to gap).
/// Input is expected upper-case, returns `None` for anything else.
#[inline]
pub const fn complement_base(c: char) -> Option<char> {
    match c {
        'A' => Some('T'),
        'T' => Some('A'),
        'C' => Some('G'),
        'G' => Some('C'),
        GAP => Some(GAP),
        _ => None,
    }
}

/// True for the four bases, false for gap and everything else.
#[inline]
pub const fn is_base(c: char) -> bool {
    matches!(c, 'A' | 'C' | 'G' | 'T')
}

/// Check a sequence (and optionally its aligned opposite) for validity.
///
/// Characters are compared case-insensitively. With an opposite strand,
/// both strands must have the same length and every column where both
/// strands carry a base must be a complementary pair.
pub fn validate(sequence: &str, opposite: Option<&str>) -> Result<(), StrandError> {
    check_alphabet(sequence)?;
    let Some(opposite) = opposite else {
        return Ok(());
    };
    check_alphabet(opposite)?;

    let (n, m) = (sequence.chars().count(), opposite.chars().count());
    if n != m {
        return Err(StrandError::LengthMismatch { main: n, opposite: m });
    }

    for (index, (c1, c2)) in sequence.chars().zip(opposite.chars()).enumerate() {
        let (c1, c2) = (c1.to_ascii_uppercase(), c2.to_ascii_uppercase());
        if c1 == GAP || c2 == GAP {
            continue;
        }
        if complement_base(c1) != Some(c2) {
            return Err(StrandError::ComplementMismatch { index, main: c1, opposite: c2 });
        }
    }
    Ok(())
}

fn check_alphabet(sequence: &str) -> Result<(), StrandError> {
    match sequence.chars().find(|c| complement_base(c.to_ascii_uppercase()).is_none()) {
        Some(c) => Err(StrandError::InvalidBase(c)),
        None => Ok(()),
    }
}

/// Per-character complement, preserving length and order.
///
/// Expects a validated (upper-case) sequence; anything outside the
/// alphabet is passed through untouched.
pub fn complement(sequence: &str) -> String {
    sequence.chars()
        .map(|c| complement_base(c).unwrap_or(c))
        .collect()
}
