//! Purchase models: payment input, the pending purchase, and outcomes.

use crate::change::{CashBundle, ChangeCombination};
use crate::denomination::Denomination;
use std::time::Instant;

/// Money handed back to the payer, exactly as inserted.
pub type Refund = CashBundle;

/// One event from the payer while a purchase collects payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentInput {
    /// A unit with the given face value was inserted.
    Insert(u32),

    /// The payer withdrew from the purchase.
    Cancel,
}

impl PaymentInput {
    /// Parses one line typed at the payment prompt.
    ///
    /// `c` (any case) cancels and a number inserts that value. Returns
    /// `None` for anything else so the caller can prompt again. Whether
    /// the number is a legal denomination is decided by the machine.
    pub fn parse(line: &str) -> Option<PaymentInput> {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("c") {
            return Some(PaymentInput::Cancel);
        }
        trimmed.parse::<u32>().ok().map(PaymentInput::Insert)
    }
}

/// A purchase that is collecting payment.
///
/// Inserted money is held here, outside the cash ledger, until the
/// purchase is evaluated.
#[derive(Debug, Clone)]
pub struct PendingPurchase {
    pub slot: u32,
    pub price: u32,
    pub inserted: CashBundle,
    pub paid: u64,
    pub last_input: Instant,
}

impl PendingPurchase {
    pub fn new(slot: u32, price: u32, now: Instant) -> Self {
        PendingPurchase {
            slot,
            price,
            inserted: CashBundle::new(),
            paid: 0,
            last_input: now,
        }
    }

    /// Records one inserted unit.
    pub fn insert(&mut self, denom: Denomination, now: Instant) {
        self.inserted.push(denom);
        self.paid += u64::from(denom.value());
        self.last_input = now;
    }

    /// Amount still owed; zero once the price is covered.
    pub fn remaining(&self) -> u64 {
        u64::from(self.price).saturating_sub(self.paid)
    }

    pub fn is_paid(&self) -> bool {
        self.paid >= u64::from(self.price)
    }
}

/// Externally visible state of the purchase flow.
///
/// Evaluation, commit and rollback happen inside a single call and are
/// never observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseState {
    Idle,
    CollectingPayment {
        slot: u32,
        price: u32,
        paid: u64,
        remaining: u64,
    },
}

/// Terminal outcome of one purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseResult {
    /// Stock decremented, payment absorbed, change dispensed.
    Success {
        slot: u32,
        paid: u64,
        change: ChangeCombination,
    },

    /// Product had no stock at selection time. No money was collected.
    OutOfStock { slot: u32 },

    /// Payer cancelled (or stopped providing input).
    UserCancelled { refund: Refund },

    /// A value outside the catalog was inserted under the abort policy.
    UnsupportedDenomination { value: u32, refund: Refund },

    /// Exact change could not be made; the purchase was rolled back.
    NoChangeAvailable { change_due: u64, refund: Refund },
}

impl PurchaseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PurchaseResult::Success { .. })
    }

    /// Money returned to the payer, if the purchase did not go through.
    pub fn refund(&self) -> Option<&Refund> {
        match self {
            PurchaseResult::Success { .. } | PurchaseResult::OutOfStock { .. } => None,
            PurchaseResult::UserCancelled { refund }
            | PurchaseResult::UnsupportedDenomination { refund, .. }
            | PurchaseResult::NoChangeAvailable { refund, .. } => Some(refund),
        }
    }
}

/// What happened after a selection or an inserted unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseStep {
    /// Still collecting payment.
    AwaitingPayment { paid: u64, remaining: u64 },

    /// The unit was not a legal denomination and was handed straight back.
    Rejected { value: u32 },

    /// The purchase reached a terminal state.
    Finished(PurchaseResult),
}
