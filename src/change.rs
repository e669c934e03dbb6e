//! Change computation over a bounded supply of denominations.
//!
//! Every physical unit on hand can be used at most once, so this is the
//! bounded variant of coin change: a 0/1 knapsack over individual units
//! that keeps, for each reachable sub-amount, the combination with the
//! fewest pieces.

use crate::denomination::Denomination;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;

/// A multiset of physical currency units.
///
/// Used for proposed or dispensed change, for money inserted during a
/// purchase, and for refunds. Only positive counts are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CashBundle {
    units: BTreeMap<Denomination, u32>,
}

/// A set of units whose total equals a requested change amount exactly.
pub type ChangeCombination = CashBundle;

impl CashBundle {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        CashBundle {
            units: BTreeMap::new(),
        }
    }

    /// Adds `count` units of `denom`.
    pub fn add(&mut self, denom: Denomination, count: u32) {
        if count == 0 {
            return;
        }
        *self.units.entry(denom).or_insert(0) += count;
    }

    /// Adds a single unit.
    pub fn push(&mut self, denom: Denomination) {
        self.add(denom, 1);
    }

    pub fn count(&self, denom: Denomination) -> u32 {
        self.units.get(&denom).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sum of `value * count`.
    pub fn total(&self) -> u64 {
        self.units
            .iter()
            .map(|(d, c)| u64::from(d.value()) * u64::from(*c))
            .sum()
    }

    /// Number of physical units.
    pub fn pieces(&self) -> u64 {
        self.units.values().map(|c| u64::from(*c)).sum()
    }

    /// Entries ascending by denomination.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.units.iter().map(|(d, c)| (*d, *c))
    }

    /// Coin entries, ascending.
    pub fn coins(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.iter().filter(|(d, _)| d.is_coin())
    }

    /// Note entries, ascending.
    pub fn notes(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.iter().filter(|(d, _)| !d.is_coin())
    }
}

impl FromIterator<(Denomination, u32)> for CashBundle {
    fn from_iter<I: IntoIterator<Item = (Denomination, u32)>>(iter: I) -> Self {
        let mut bundle = CashBundle::new();
        for (denom, count) in iter {
            bundle.add(denom, count);
        }
        bundle
    }
}

impl fmt::Display for CashBundle {
    /// Formats as `20x2, 10x1` with the largest denomination first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "nothing");
        }
        let parts: Vec<String> = self
            .units
            .iter()
            .rev()
            .map(|(d, c)| format!("{}x{}", d, c))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Best known way to reach one sub-amount.
#[derive(Clone)]
struct Tally {
    /// Units used per supply position.
    counts: Vec<u32>,
    pieces: u32,
}

/// Computes a minimal-piece combination summing exactly to `amount`,
/// using at most the given count of each denomination.
///
/// Returns `None` if no exact combination exists. `available` is only read;
/// repeated denominations in it accumulate. Denominations are processed
/// from largest to smallest and ties keep the first combination found, so
/// the result is deterministic.
///
/// # Examples
///
/// ```
/// use vending_engine::{compute_change, Denomination};
///
/// let d = |v| Denomination::new(v).unwrap();
/// let available = [(d(10), 1), (d(5), 3), (d(1), 5), (d(20), 1)];
///
/// let change = compute_change(5, available).unwrap();
/// assert_eq!(change.count(d(5)), 1);
/// assert_eq!(change.pieces(), 1);
///
/// assert!(compute_change(5, [(d(1), 2)]).is_none());
/// ```
pub fn compute_change<I>(amount: u32, available: I) -> Option<ChangeCombination>
where
    I: IntoIterator<Item = (Denomination, u32)>,
{
    if amount == 0 {
        return Some(ChangeCombination::new());
    }

    let mut merged: BTreeMap<Denomination, u32> = BTreeMap::new();
    for (denom, count) in available {
        if count > 0 && denom.value() <= amount {
            let entry = merged.entry(denom).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }

    // Largest first; a unit beyond amount / value can never be part of an
    // exact combination.
    let supply: Vec<(Denomination, u32)> = merged
        .into_iter()
        .rev()
        .map(|(d, c)| (d, c.min(amount / d.value())))
        .collect();

    let reachable: u64 = supply
        .iter()
        .map(|(d, c)| u64::from(d.value()) * u64::from(*c))
        .sum();
    if reachable < u64::from(amount) {
        debug!(
            "Change for {} is infeasible, only {} reachable with available cash",
            amount, reachable
        );
        return None;
    }

    let target = amount as usize;
    let mut best: Vec<Option<Tally>> = vec![None; target + 1];
    best[0] = Some(Tally {
        counts: vec![0; supply.len()],
        pieces: 0,
    });

    for (position, (denom, units)) in supply.iter().enumerate() {
        let step = denom.value() as usize;
        for _ in 0..*units {
            // Scan downward so this unit is used at most once per pass.
            for sub in (step..=target).rev() {
                let prev_pieces = match &best[sub - step] {
                    Some(prev) => prev.pieces,
                    None => continue,
                };
                let improves = best[sub]
                    .as_ref()
                    .map_or(true, |current| prev_pieces + 1 < current.pieces);
                if !improves {
                    continue;
                }
                if let Some(mut candidate) = best[sub - step].clone() {
                    candidate.counts[position] += 1;
                    candidate.pieces += 1;
                    best[sub] = Some(candidate);
                }
            }
        }
    }

    match best[target].take() {
        Some(tally) => {
            let combination: ChangeCombination = supply
                .iter()
                .zip(tally.counts)
                .map(|((denom, _), used)| (*denom, used))
                .collect();
            debug!(
                "Change for {}: {} ({} pieces)",
                amount,
                combination,
                combination.pieces()
            );
            Some(combination)
        }
        None => {
            debug!("Change for {} is infeasible with available cash", amount);
            None
        }
    }
}

/// Dry run of [`compute_change`]: reports whether exact change exists.
pub fn can_pay<I>(amount: u32, available: I) -> bool
where
    I: IntoIterator<Item = (Denomination, u32)>,
{
    compute_change(amount, available).is_some()
}
