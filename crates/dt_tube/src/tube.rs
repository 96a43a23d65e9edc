//! The reaction vessel.
//!
//! A `Tube` is a multiset of DNA molecules: every distinct molecule (by
//! strand content) has a positive copy count. Entries live in an arena
//! in insertion order, with a hash index from molecule to arena slot.
//! Operations act on whole populations and never fail; an empty tube is
//! a valid input to all of them.
//!

use std::fmt;
use ahash::AHashMap;
use itertools::Itertools;
use log::{debug, trace};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use dt_strand::Dna;
use dt_strand::complement;

use crate::FailureRates;
use crate::succeeds;

#[derive(Debug)]
pub struct Tube<R = StdRng> {
    entries: Vec<(Dna, u64)>,
    index: AHashMap<Dna, usize>,
    rates: FailureRates,
    rng: R,
}

impl Tube<StdRng> {
    /// An empty tube with default failure rates and an OS-seeded generator.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng(), FailureRates::default())
    }

    /// An empty tube with default failure rates and a reproducible generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), FailureRates::default())
    }
}

impl Default for Tube<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Tube<R> {
    pub fn with_rng(rng: R, rates: FailureRates) -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::default(),
            rates,
            rng,
        }
    }

    pub fn rates(&self) -> FailureRates {
        self.rates
    }

    pub fn set_rates(&mut self, rates: FailureRates) {
        self.rates = rates;
    }

    /// Number of distinct molecules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of molecules, counting every copy.
    pub fn total_copies(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Copy count of a molecule (0 if absent).
    pub fn count(&self, dna: &Dna) -> u64 {
        self.index.get(dna).map_or(0, |&i| self.entries[i].1)
    }

    /// Molecules and their counts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Dna, u64)> {
        self.entries.iter().map(|(dna, count)| (dna, *count))
    }

    /// Add `count` copies of `dna`, merging with an identical molecule.
    /// Zero counts and molecules without bases are ignored.
    pub fn insert(&mut self, dna: Dna, count: u64) {
        if count == 0 || dna.is_empty() {
            return;
        }
        match self.index.get(&dna) {
            Some(&i) => {
                let entry = &mut self.entries[i].1;
                *entry = entry.saturating_add(count);
            }
            None => {
                self.index.insert(dna.clone(), self.entries.len());
                self.entries.push((dna, count));
            }
        }
    }

    fn rebuild(&mut self, items: impl IntoIterator<Item = (Dna, u64)>) {
        self.entries.clear();
        self.index.clear();
        for (dna, count) in items {
            self.insert(dna, count);
        }
    }

    /// Pour the contents of another tube into this one.
    pub fn add<S>(&mut self, other: &Tube<S>) {
        for (dna, count) in other.iter() {
            self.insert(dna.clone(), count);
        }
        debug!("add: {} molecule(s) poured in, now {}", other.len(), self.len());
    }

    /// Gel electrophoresis: molecules with their length, shortest first.
    /// Molecules of equal length keep their insertion order.
    pub fn length_sort(&self) -> Vec<(usize, &Dna)> {
        let mut sorted: Vec<(usize, &Dna)> = self.entries.iter()
            .map(|(dna, _)| (dna.len(), dna))
            .collect();
        sorted.sort_by_key(|&(len, _)| len);
        sorted
    }

    /// Heat the tube: every double strand falls apart into single strands.
    ///
    /// Liberated strands join the tube with their parent's count, the
    /// parent itself stays as its single-stranded main strand.
    pub fn separate(&mut self) {
        let before = self.len();
        let mut retained = Vec::with_capacity(before);
        let mut liberated = Vec::new();
        for (dna, count) in std::mem::take(&mut self.entries) {
            let (main, strands) = dna.separate();
            retained.push((main, count));
            liberated.extend(strands.into_iter().map(|s| (s, count)));
        }
        self.rebuild(retained.into_iter().chain(liberated));
        debug!("separate: {before} -> {} molecule(s)", self.len());
    }

    /// Digest every molecule with a restriction enzyme recognizing `site`.
    ///
    /// All fragments of a molecule inherit its count.
    pub fn cleave(&mut self, site: &str) {
        let before = self.len();
        let mut receivers = Vec::with_capacity(before);
        let mut fragments = Vec::new();
        for (dna, count) in std::mem::take(&mut self.entries) {
            let (receiver, cut) = dna.cleave(site);
            receivers.push((receiver, count));
            fragments.extend(cut.into_iter().map(|f| (f, count)));
        }
        self.rebuild(receivers.into_iter().chain(fragments));
        debug!("cleave {site}: {before} -> {} molecule(s)", self.len());
    }

    /// Cool the tube down so that complementary regions anneal.
    ///
    /// Every unordered pair of molecules present at the start is tried
    /// once. Of a pair, the single-stranded molecule that is not longer
    /// than its partner lands on the partner; if neither (or both)
    /// qualify, the first molecule of the pair receives the second. As
    /// many copies anneal as both sides can supply. New double strands
    /// are only added after the pass, so one call anneals one layer;
    /// call again to let products combine further.
    pub fn cool(&mut self) {
        let before = self.len();
        let mut counts: Vec<u64> = self.entries.iter().map(|(_, c)| *c).collect();
        let mut products: Vec<(Dna, u64)> = Vec::new();

        for (i, j) in (0..self.entries.len()).tuple_combinations() {
            if counts[i] == 0 || counts[j] == 0 {
                continue;
            }
            let (m, s) = self.pick_sides(i, j);
            let (main, single) = (&self.entries[m].0, &self.entries[s].0);
            let Some(at) = main.combine_index(single) else {
                continue;
            };

            let annealed = counts[m].min(counts[s]);
            counts[m] -= annealed;
            counts[s] -= annealed;

            let strand = complement(&main.main()[at..at + single.len()]);
            let mut product = main.clone();
            product.add_opposite(at, &strand);
            trace!("cool: {} x {} annealed onto {} at {at}", annealed, single.main(), main.main());
            products.push((product, annealed));
        }

        let survivors: Vec<(Dna, u64)> = std::mem::take(&mut self.entries)
            .into_iter()
            .zip(counts)
            .map(|((dna, _), count)| (dna, count))
            .collect();
        let annealings = products.len();
        self.rebuild(survivors.into_iter().chain(products));
        debug!("cool: {annealings} annealing(s), {before} -> {} molecule(s)", self.len());
    }

    /// Returns (main side, single side) for a pair of arena slots.
    fn pick_sides(&self, i: usize, j: usize) -> (usize, usize) {
        let qualifies = |s: usize, o: usize| {
            let (s, o) = (&self.entries[s].0, &self.entries[o].0);
            s.is_single() && s.len() <= o.len()
        };
        if qualifies(j, i) {
            (i, j)
        } else if qualifies(i, j) {
            (j, i)
        } else {
            (i, j)
        }
    }
}

impl<R: Rng> Tube<R> {
    /// Bead selection: keep only molecules containing `sequence`.
    ///
    /// A matching molecule is lost with the filter failure rate. Whole
    /// molecules (all copies) are kept or dropped together.
    pub fn filter(&mut self, sequence: &str) {
        let before = self.len();
        let rate = self.rates.filter();
        let kept: Vec<(Dna, u64)> = std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|(dna, _)| dna.contains(sequence) && succeeds(&mut self.rng, rate))
            .collect();
        self.rebuild(kept);
        debug!("filter {sequence}: {before} -> {} molecule(s)", self.len());
    }

    /// PCR: molecules containing `sequence` double per iteration.
    ///
    /// Amplification of a matching molecule fails with the amplify
    /// failure rate, leaving its count untouched.
    pub fn amplify(&mut self, sequence: &str, iterations: u32) {
        let factor = 2u64.saturating_pow(iterations);
        let rate = self.rates.amplify();
        let mut amplified = 0;
        for (dna, count) in self.entries.iter_mut() {
            if dna.contains(sequence) && succeeds(&mut self.rng, rate) {
                *count = count.saturating_mul(factor);
                amplified += 1;
            }
        }
        debug!("amplify {sequence} x{factor}: {amplified} of {} molecule(s)", self.len());
    }
}

impl<R: Rng + SeedableRng> Tube<R> {
    /// Pour an independent copy of this tube.
    ///
    /// The copy keeps the failure rates and draws from its own generator,
    /// seeded from this tube's stream.
    pub fn duplicate(&mut self) -> Self {
        Self {
            entries: self.entries.clone(),
            index: self.index.clone(),
            rates: self.rates,
            rng: R::from_rng(&mut self.rng),
        }
    }
}

impl<R> Extend<(Dna, u64)> for Tube<R> {
    fn extend<I: IntoIterator<Item = (Dna, u64)>>(&mut self, iter: I) {
        for (dna, count) in iter {
            self.insert(dna, count);
        }
    }
}

impl FromIterator<(Dna, u64)> for Tube<StdRng> {
    fn from_iter<I: IntoIterator<Item = (Dna, u64)>>(iter: I) -> Self {
        let mut tube = Tube::new();
        tube.extend(iter);
        tube
    }
}

impl<R> fmt::Display for Tube<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (k, (dna, count)) in self.entries.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            if dna.is_single() {
                write!(f, "{}: {count}", dna.main())?;
            } else {
                write!(f, "\n{}\n{}: {count}", dna.main(), dna.opposite())?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna(main: &str) -> Dna {
        Dna::try_from(main).unwrap()
    }

    fn exact(items: &[(&str, u64)]) -> Tube {
        let mut tube = Tube::with_rng(StdRng::seed_from_u64(1), FailureRates::none());
        tube.extend(items.iter().map(|&(m, c)| (dna(m), c)));
        tube
    }

    #[test]
    fn test_insert_merges_and_ignores_zero() {
        let mut tube = exact(&[("ACGT", 2)]);
        tube.insert(dna("acgt"), 3);
        tube.insert(dna("GGG"), 0);
        tube.insert(dna("   "), 4);
        assert_eq!(tube.len(), 1);
        assert_eq!(tube.count(&dna("ACGT")), 5);
        assert_eq!(tube.count(&dna("GGG")), 0);
        assert_eq!(tube.total_copies(), 5);
    }

    #[test]
    fn test_filter_exact() {
        let mut tube = exact(&[("AACCGG", 3), ("TTTT", 2), ("CCGGAA", 7)]);
        tube.filter("CCGG");
        assert_eq!(tube.len(), 2);
        assert_eq!(tube.count(&dna("AACCGG")), 3);
        assert_eq!(tube.count(&dna("CCGGAA")), 7);
        assert_eq!(tube.count(&dna("TTTT")), 0);

        tube.filter("GGG");
        assert!(tube.is_empty());
        tube.filter("A");
        assert!(tube.is_empty());
    }

    #[test]
    fn test_filter_probes_opposite_strand() {
        let mut tube = exact(&[("AAAA", 1)]);
        tube.insert(Dna::double_helix("AACG").unwrap(), 4);
        // "TTGC" read 5'->3' is "CGTT".
        tube.filter("CGTT");
        assert_eq!(tube.len(), 1);
        assert_eq!(tube.count(&Dna::double_helix("AACG").unwrap()), 4);
    }

    #[test]
    fn test_filter_always_failing() {
        let mut tube = exact(&[("ACGT", 3), ("ACGA", 1)]);
        tube.set_rates(FailureRates::new(1.0, 0.0).unwrap());
        tube.filter("ACG");
        assert!(tube.is_empty());
    }

    #[test]
    fn test_amplify_exact() {
        let mut tube = exact(&[("AACCGG", 3), ("TTTT", 2)]);
        tube.amplify("CCG", 4);
        assert_eq!(tube.count(&dna("AACCGG")), 48);
        assert_eq!(tube.count(&dna("TTTT")), 2);
        tube.amplify("TT", 0);
        assert_eq!(tube.count(&dna("TTTT")), 2);
        tube.amplify("TT", 70);
        assert_eq!(tube.count(&dna("TTTT")), u64::MAX);
    }

    #[test]
    fn test_amplify_always_failing() {
        let mut tube = exact(&[("AACCGG", 3)]);
        tube.set_rates(FailureRates::new(0.0, 1.0).unwrap());
        tube.amplify("CCG", 3);
        assert_eq!(tube.count(&dna("AACCGG")), 3);
    }

    #[test]
    fn test_seeded_failures_are_reproducible() {
        let run = |seed: u64| {
            let rates = FailureRates::new(0.5, 0.5).unwrap();
            let mut tube = Tube::with_rng(StdRng::seed_from_u64(seed), rates);
            for k in 1..=40 {
                let main: String = std::iter::repeat_n("AC", k).collect();
                tube.insert(dna(&main), 1);
            }
            tube.amplify("ACAC", 2);
            tube.filter("CA");
            tube.iter().map(|(d, c)| (d.clone(), c)).collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
        let survivors = run(11).len();
        assert!(survivors > 0 && survivors < 40, "{survivors}");
    }

    #[test]
    fn test_cool_conservation() {
        let mut tube = exact(&[("AAAA", 3), ("TTTT", 5)]);
        tube.cool();
        let combined = Dna::try_from(("AAAA", "TTTT")).unwrap();
        assert_eq!(tube.count(&dna("AAAA")), 0);
        assert_eq!(tube.count(&dna("TTTT")), 2);
        assert_eq!(tube.count(&combined), 3);
        assert_eq!(tube.len(), 2);
    }

    #[test]
    fn test_cool_single_lands_on_longer() {
        let mut tube = exact(&[("CG", 4), ("ATGCAT", 1)]);
        tube.cool();
        let combined = Dna::try_from(("ATGCAT", "  CG  ")).unwrap();
        assert_eq!(tube.count(&combined), 1);
        assert_eq!(tube.count(&dna("CG")), 3);
        assert_eq!(tube.count(&dna("ATGCAT")), 0);
    }

    #[test]
    fn test_cool_snapshot() {
        // The product of the first annealing is not paired again in the same pass.
        let mut tube = exact(&[("AAAATTT", 1), ("TTTT", 1), ("AAA", 1)]);
        tube.cool();
        assert_eq!(tube.len(), 2);
        assert_eq!(tube.count(&Dna::try_from(("AAAATTT", "TTTT   ")).unwrap()), 1);
        assert_eq!(tube.count(&dna("AAA")), 1);
        tube.cool();
        assert_eq!(tube.len(), 1);
        assert_eq!(tube.count(&Dna::double_helix("AAAATTT").unwrap()), 1);
    }

    #[test]
    fn test_cool_without_partners() {
        let mut tube = exact(&[("AAAA", 2), ("CCCC", 1)]);
        tube.cool();
        assert_eq!(tube.count(&dna("AAAA")), 2);
        assert_eq!(tube.count(&dna("CCCC")), 1);

        let mut empty = exact(&[]);
        empty.cool();
        empty.separate();
        empty.cleave("GA");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_separate_counts() {
        let mut tube = exact(&[("CCGT", 1)]);
        tube.insert(Dna::double_helix("ACGG").unwrap(), 2);
        tube.separate();
        // "ACGG" liberates "CCGT", merging with the existing single strand.
        assert_eq!(tube.len(), 2);
        assert_eq!(tube.count(&dna("CCGT")), 3);
        assert_eq!(tube.count(&dna("ACGG")), 2);
    }

    #[test]
    fn test_cleave_counts() {
        let mut tube = exact(&[("TTACTT", 1)]);
        tube.insert(Dna::double_helix("TTACTT").unwrap(), 5);
        tube.cleave("TG");
        assert_eq!(tube.len(), 3);
        assert_eq!(tube.count(&dna("TTACTT")), 1);
        assert_eq!(tube.count(&Dna::try_from(("ACTT", "  AA")).unwrap()), 5);
        assert_eq!(tube.count(&Dna::try_from(("TT  ", "AATG")).unwrap()), 5);
    }

    #[test]
    fn test_add() {
        let mut a = exact(&[("ACGT", 2), ("GG", 1)]);
        let b = exact(&[("ACGT", 3), ("TT", 4)]);
        a.add(&b);
        assert_eq!(a.count(&dna("ACGT")), 5);
        assert_eq!(a.count(&dna("GG")), 1);
        assert_eq!(a.count(&dna("TT")), 4);
        assert_eq!(b.count(&dna("ACGT")), 3);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut a = exact(&[("ACGT", 2), ("GG", 1)]);
        let mut b = a.duplicate();
        assert_eq!(b.rates(), a.rates());
        b.filter("GG");
        b.amplify("GG", 1);
        assert_eq!(a.count(&dna("ACGT")), 2);
        assert_eq!(a.count(&dna("GG")), 1);
        assert_eq!(b.count(&dna("ACGT")), 0);
        assert_eq!(b.count(&dna("GG")), 2);
        a.insert(dna("CCC"), 1);
        assert_eq!(b.count(&dna("CCC")), 0);
    }

    #[test]
    fn test_length_sort() {
        let tube = exact(&[("ACGTA", 1), ("GG", 1), ("TTT", 1), ("CC", 9)]);
        let sorted: Vec<(usize, &str)> = tube.length_sort()
            .into_iter()
            .map(|(l, d)| (l, d.main()))
            .collect();
        assert_eq!(sorted, vec![(2, "GG"), (2, "CC"), (3, "TTT"), (5, "ACGTA")]);
    }

    #[test]
    fn test_display() {
        let mut tube = exact(&[("ACG", 2)]);
        tube.insert(Dna::double_helix("GC").unwrap(), 1);
        assert_eq!(format!("{tube}"), "{ACG: 2, \nGC\nCG: 1}");
    }
}
