//! Single- and double-stranded DNA molecules.
//!
//! A `Dna` holds two aligned strands of equal length:
//!
//! ```text
//!   main:      ACTGGA      (5' -> 3')
//!   opposite:    ACCTGA    (3' -> 5')
//! ```
//!
//! Columns where only one strand carries a base are sticky ends, columns
//! where both carry a base are Watson-Crick pairs. Molecules are always
//! trimmed: neither end has a column that is gap on both strands.
//!

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::ops::Range;
use log::trace;

use crate::StrandError;
use crate::GAP;
use crate::validate;
use crate::complement;

const GAP_BYTE: u8 = GAP as u8;

/// A DNA molecule: main strand 5'->3' over an aligned opposite strand 3'->5'.
///
/// Equality and hashing consider only the strand content.
#[derive(Debug, Clone)]
pub struct Dna {
    main: String,
    opposite: String,
    single: bool,
}

impl Dna {
    /// Construct from a main strand and an optional aligned opposite strand.
    pub fn new(main: &str, opposite: Option<&str>) -> Result<Self, StrandError> {
        validate(main, opposite)?;
        let main = main.to_ascii_uppercase();
        let opposite = match opposite {
            Some(o) => o.to_ascii_uppercase(),
            None => gaps(main.len()),
        };
        Ok(Self::from_aligned(main, opposite))
    }

    /// Construct a fully paired double helix from the main strand.
    pub fn double_helix(main: &str) -> Result<Self, StrandError> {
        validate(main, None)?;
        let main = main.to_ascii_uppercase();
        let opposite = complement(&main);
        Ok(Self::from_aligned(main, opposite))
    }

    /// Trusted constructor: strands must be upper-case, aligned and valid.
    fn from_aligned(main: String, opposite: String) -> Self {
        debug_assert_eq!(main.len(), opposite.len());
        let (m, o) = (main.as_bytes(), opposite.as_bytes());
        let occupied = |i: &usize| m[*i] != GAP_BYTE || o[*i] != GAP_BYTE;

        let start = (0..m.len()).find(occupied).unwrap_or(m.len());
        let end = (start..m.len()).rfind(occupied).map_or(start, |i| i + 1);

        let main = main[start..end].to_string();
        let opposite = opposite[start..end].to_string();
        let single = is_vacant(&opposite);
        Dna { main, opposite, single }
    }

    fn from_single(main: String) -> Self {
        let opposite = gaps(main.len());
        Self::from_aligned(main, opposite)
    }

    pub fn main(&self) -> &str {
        &self.main
    }

    pub fn opposite(&self) -> &str {
        &self.opposite
    }

    /// True if the molecule is flagged single-stranded.
    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Number of columns (the length of the trimmed main strand).
    pub fn len(&self) -> usize {
        self.main.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }

    /// Number of bases on both strands together.
    pub fn base_count(&self) -> usize {
        self.main.bytes()
            .chain(self.opposite.bytes())
            .filter(|&b| b != GAP_BYTE)
            .count()
    }

    /// Count of A, C, G and T over both strands (in that order).
    pub fn composition(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for b in self.main.bytes().chain(self.opposite.bytes()) {
            match b {
                b'A' => counts[0] += 1,
                b'C' => counts[1] += 1,
                b'G' => counts[2] += 1,
                b'T' => counts[3] += 1,
                _ => (),
            }
        }
        counts
    }

    /// True if `sequence` occurs in the main strand, or in the opposite
    /// strand read 5'->3'. Either physical strand can be probed.
    pub fn contains(&self, sequence: &str) -> bool {
        let sequence = sequence.to_ascii_uppercase();
        if self.main.contains(&sequence) {
            return true;
        }
        let reversed: String = self.opposite.chars().rev().collect();
        reversed.contains(&sequence)
    }

    /// Heat denaturation.
    ///
    /// Returns the now single-stranded main strand together with every
    /// maximal run of the opposite strand, each turned into a single
    /// strand read 5'->3'.
    pub fn separate(&self) -> (Dna, Vec<Dna>) {
        let liberated = self.opposite
            .split(GAP)
            .filter(|run| !run.is_empty())
            .map(|run| Dna::from_single(run.chars().rev().collect()))
            .collect();
        (Dna::from_single(self.main.clone()), liberated)
    }

    /// Restriction digest at every occurrence of `site` in the opposite strand.
    ///
    /// Occurrences are found leftmost-first without overlap. Each one cuts
    /// the main strand at the start of the occurrence and the opposite
    /// strand at its end, leaving staggered (sticky) ends. Every base of
    /// the molecule ends up in exactly one fragment.
    ///
    /// Returns the molecule that takes the place of `self` (the last
    /// fragment) and all other fragments. Without an occurrence, the
    /// molecule is returned unchanged together with no fragments.
    pub fn cleave(&self, site: &str) -> (Dna, Vec<Dna>) {
        let site = site.to_ascii_uppercase();
        if site.is_empty() {
            return (self.clone(), Vec::new());
        }
        let starts: Vec<usize> = self.opposite
            .match_indices(site.as_str())
            .map(|(i, _)| i)
            .collect();
        if starts.is_empty() {
            return (self.clone(), Vec::new());
        }

        let n = self.len();
        let main_cuts: Vec<usize> = std::iter::once(0)
            .chain(starts.iter().copied())
            .chain(std::iter::once(n))
            .collect();
        let opposite_cuts: Vec<usize> = std::iter::once(0)
            .chain(starts.iter().map(|&s| s + site.len()))
            .chain(std::iter::once(n))
            .collect();

        let mut fragments = Vec::new();
        for w in 0..=starts.len() {
            fragments.extend(self.fragment(
                main_cuts[w]..main_cuts[w + 1],
                opposite_cuts[w]..opposite_cuts[w + 1],
            ));
        }
        trace!("cleave {site}: {} cut(s), {} fragment(s) from {}",
            starts.len(), fragments.len(), self.main);

        match fragments.pop() {
            Some(last) => (last, fragments),
            None => (self.clone(), fragments),
        }
    }

    /// Cut out the given main and opposite columns, keeping their alignment.
    /// If the two pieces share no paired column, they fall apart into
    /// single strands.
    fn fragment(&self, main: Range<usize>, opposite: Range<usize>) -> Vec<Dna> {
        let span = main.start.min(opposite.start)..main.end.max(opposite.end);
        let columns = |keep: &Range<usize>, strand: &str| -> String {
            let bytes = strand.as_bytes();
            span.clone()
                .map(|i| if keep.contains(&i) { bytes[i] as char } else { GAP })
                .collect()
        };
        let m = columns(&main, &self.main);
        let o = columns(&opposite, &self.opposite);

        let paired = m.bytes().zip(o.bytes())
            .any(|(a, b)| a != GAP_BYTE && b != GAP_BYTE);
        let piece = Dna::from_aligned(m, o);
        if paired {
            return vec![piece];
        }
        let (main, mut liberated) = piece.separate();
        if !main.is_empty() {
            liberated.insert(0, main);
        }
        liberated
    }

    /// Find where `other` can anneal onto this molecule.
    ///
    /// First, the complement of `other`'s main strand is searched in the
    /// main strand where the opposite strand is vacant over the whole
    /// span. Only if that fails and `other` is double-stranded with a
    /// vacant opposite strand, `other`'s main strand itself is searched
    /// the same way (sticky-end ligation). Returns the leftmost offset of
    /// the first search that succeeds.
    pub fn combine_index(&self, other: &Dna) -> Option<usize> {
        if other.is_empty() || other.len() > self.len() {
            return None;
        }
        let probe = complement(&other.main);
        if let Some(i) = self.landing_sites(&probe).next() {
            return Some(i);
        }
        if !other.single && is_vacant(&other.opposite) {
            return self.landing_sites(&other.main).next();
        }
        None
    }

    /// All offsets where `probe` matches the main strand over a vacant opposite.
    fn landing_sites<'a>(&'a self, probe: &'a str) -> impl Iterator<Item = usize> + 'a {
        let width = probe.len();
        (0..(self.len() + 1).saturating_sub(width))
            .filter(move |&i| {
                &self.main[i..i + width] == probe 
                    && is_vacant(&self.opposite[i..i + width])
            })
    }

    /// Overwrite the opposite strand starting at `start` with `strand`.
    ///
    /// Trusted: `strand` must fit and be complementary to the main strand
    /// in every paired column. Nothing is re-validated.
    pub fn add_opposite(&mut self, start: usize, strand: &str) {
        debug_assert!(start + strand.len() <= self.opposite.len());
        self.opposite.replace_range(start..start + strand.len(), strand);
        if !strand.is_empty() {
            self.single = false;
        }
    }
}

fn gaps(len: usize) -> String {
    std::iter::repeat_n(GAP, len).collect()
}

fn is_vacant(strand: &str) -> bool {
    strand.bytes().all(|b| b == GAP_BYTE)
}

impl PartialEq for Dna {
    fn eq(&self, other: &Self) -> bool {
        self.main == other.main && self.opposite == other.opposite
    }
}

impl Eq for Dna {}

impl Hash for Dna {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.main.hash(state);
        self.opposite.hash(state);
    }
}

impl TryFrom<&str> for Dna {
    type Error = StrandError;

    fn try_from(main: &str) -> Result<Self, Self::Error> {
        Dna::new(main, None)
    }
}

impl TryFrom<(&str, &str)> for Dna {
    type Error = StrandError;

    fn try_from((main, opposite): (&str, &str)) -> Result<Self, Self::Error> {
        Dna::new(main, Some(opposite))
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.single {
            write!(f, "{}", self.main)
        } else {
            write!(f, "{}\n{}", self.main, self.opposite)
        }
    }
}
