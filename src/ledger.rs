//! Cash ledger: the machine's on-hand count of each denomination.
//!
//! Counts are unsigned and every mutation is checked, so the ledger can
//! never hold a negative count. An absent denomination means zero; entries
//! that drop to zero are removed to keep the representation canonical.

use crate::change::CashBundle;
use crate::denomination::Denomination;
use crate::error::{Result, VendingError};
use std::collections::BTreeMap;

/// Mutable mapping of denomination to count on hand.
///
/// # Invariants
///
/// - No count is ever negative, and `remove` never clamps
/// - Only catalog denominations can be stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CashLedger {
    cash: BTreeMap<Denomination, u32>,
}

/// Independent copy of a ledger, used to simulate and roll back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    cash: BTreeMap<Denomination, u32>,
}

impl LedgerSnapshot {
    /// Count held for `denom` at snapshot time.
    pub fn count(&self, denom: Denomination) -> u32 {
        self.cash.get(&denom).copied().unwrap_or(0)
    }
}

impl CashLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        CashLedger {
            cash: BTreeMap::new(),
        }
    }

    /// Builds a ledger from raw `(value, count)` pairs.
    ///
    /// Fails with `InvalidDenomination` if any value is outside the catalog.
    /// Repeated values accumulate.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut ledger = CashLedger::new();
        for (value, count) in counts {
            let denom = Denomination::new(value)?;
            ledger.add(denom, count)?;
        }
        Ok(ledger)
    }

    /// Count on hand for `denom`.
    pub fn count(&self, denom: Denomination) -> u32 {
        self.cash.get(&denom).copied().unwrap_or(0)
    }

    /// Returns `true` if no units are held.
    pub fn is_empty(&self) -> bool {
        self.cash.is_empty()
    }

    /// Sum of `value * count` over every denomination.
    pub fn total_value(&self) -> u64 {
        self.cash
            .iter()
            .map(|(d, c)| u64::from(d.value()) * u64::from(*c))
            .sum()
    }

    /// Non-zero entries, ascending by denomination.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.cash.iter().map(|(d, c)| (*d, *c))
    }

    /// Adds `count` units of `denom`.
    pub fn add(&mut self, denom: Denomination, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let current = self.count(denom);
        let updated = current
            .checked_add(count)
            .ok_or(VendingError::CountOverflow(denom.value()))?;
        self.cash.insert(denom, updated);
        Ok(())
    }

    /// Adds `count` units of the denomination with face value `value`.
    ///
    /// Unknown values are rejected with `InvalidDenomination`.
    pub fn add_value(&mut self, value: u32, count: u32) -> Result<()> {
        let denom = Denomination::new(value)?;
        self.add(denom, count)
    }

    /// Removes `count` units of `denom`.
    ///
    /// Fails with `InsufficientCash` without mutating if fewer than `count`
    /// units are on hand.
    pub fn remove(&mut self, denom: Denomination, count: u32) -> Result<()> {
        let current = self.count(denom);
        if count > current {
            return Err(VendingError::InsufficientCash {
                denomination: denom.value(),
                requested: count,
                available: current,
            });
        }

        let remaining = current - count;
        if remaining == 0 {
            self.cash.remove(&denom);
        } else {
            self.cash.insert(denom, remaining);
        }
        Ok(())
    }

    /// Adds every unit in `bundle`.
    ///
    /// Either all units are added or, on overflow, none are.
    pub fn absorb(&mut self, bundle: &CashBundle) -> Result<()> {
        for (denom, count) in bundle.iter() {
            if self.count(denom).checked_add(count).is_none() {
                return Err(VendingError::CountOverflow(denom.value()));
            }
        }
        for (denom, count) in bundle.iter() {
            self.add(denom, count)?;
        }
        Ok(())
    }

    /// Removes every unit in `bundle`.
    ///
    /// Either all units are removed or, if any count is short, none are.
    pub fn dispense(&mut self, bundle: &CashBundle) -> Result<()> {
        for (denom, count) in bundle.iter() {
            let available = self.count(denom);
            if count > available {
                return Err(VendingError::InsufficientCash {
                    denomination: denom.value(),
                    requested: count,
                    available,
                });
            }
        }
        for (denom, count) in bundle.iter() {
            self.remove(denom, count)?;
        }
        Ok(())
    }

    /// Returns an independent copy of the current counts.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            cash: self.cash.clone(),
        }
    }

    /// Replaces the live counts wholesale with `snapshot`.
    pub fn restore(&mut self, snapshot: &LedgerSnapshot) {
        self.cash = snapshot.cash.clone();
    }
}
