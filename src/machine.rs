//! The vending machine and its purchase coordinator.
//!
//! A purchase moves through `Idle -> CollectingPayment -> Evaluating ->
//! Committed | RolledBack -> Idle`. Inserted money stays with the pending
//! purchase until evaluation. Evaluation snapshots the cash ledger, absorbs
//! the payment, computes change against the updated ledger, and then either
//! commits (dispense change, decrement stock) or restores the snapshot.

use crate::change::{compute_change, CashBundle};
use crate::config::{Config, RejectPolicy};
use crate::denomination::Denomination;
use crate::error::{Result, VendingError};
use crate::ledger::CashLedger;
use crate::product::{ProductCatalog, ProductListing};
use crate::transaction::{
    PaymentInput, PendingPurchase, PurchaseResult, PurchaseState, PurchaseStep,
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// A single vending machine: its products, its cash, and at most one
/// purchase in progress.
///
/// Every mutating operation takes `&mut self`, so one purchase runs to
/// completion before another can begin.
pub struct VendingMachine {
    catalog: ProductCatalog,
    ledger: CashLedger,
    pending: Option<PendingPurchase>,
    reject_policy: RejectPolicy,
    idle_timeout: Option<Duration>,
}

impl VendingMachine {
    /// Creates a machine with the default purchase settings.
    pub fn new(catalog: ProductCatalog, ledger: CashLedger) -> Self {
        let defaults = Config::default();
        VendingMachine {
            catalog,
            ledger,
            pending: None,
            reject_policy: defaults.reject_policy,
            idle_timeout: defaults.idle_timeout,
        }
    }

    /// Applies the purchase settings from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.reject_policy = config.reject_policy;
        self.idle_timeout = config.idle_timeout;
        self
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &CashLedger {
        &self.ledger
    }

    /// Products ascending by slot, with availability.
    pub fn list_products(&self) -> Vec<ProductListing> {
        self.catalog.listing()
    }

    pub fn state(&self) -> PurchaseState {
        match &self.pending {
            None => PurchaseState::Idle,
            Some(p) => PurchaseState::CollectingPayment {
                slot: p.slot,
                price: p.price,
                paid: p.paid,
                remaining: p.remaining(),
            },
        }
    }

    /// Starts a purchase for `slot`.
    ///
    /// An out-of-stock product finishes immediately with `OutOfStock` and
    /// leaves the machine idle.
    pub fn select(&mut self, slot: u32) -> Result<PurchaseStep> {
        if let Some(pending) = &self.pending {
            return Err(VendingError::PurchaseInProgress(pending.slot));
        }

        let product = self
            .catalog
            .get(slot)
            .ok_or(VendingError::UnknownSlot(slot))?;

        if !product.is_available() {
            debug!("Slot {}: {} is out of stock", slot, product.name());
            return Ok(PurchaseStep::Finished(PurchaseResult::OutOfStock { slot }));
        }

        let price = product.price();
        debug!("Slot {}: selected {} at {}", slot, product.name(), price);
        self.pending = Some(PendingPurchase::new(slot, price, Instant::now()));

        Ok(PurchaseStep::AwaitingPayment {
            paid: 0,
            remaining: u64::from(price),
        })
    }

    /// Accepts one inserted unit with face value `value`.
    ///
    /// Once the running total covers the price the purchase is evaluated
    /// and the terminal result returned.
    pub fn insert_money(&mut self, value: u32) -> Result<PurchaseStep> {
        let pending = self.pending.as_mut().ok_or(VendingError::NoActivePurchase)?;
        let now = Instant::now();

        let denom = match Denomination::new(value) {
            Ok(denom) => denom,
            Err(_) => match self.reject_policy {
                RejectPolicy::Reprompt => {
                    warn!("Slot {}: rejected unsupported value {}", pending.slot, value);
                    pending.last_input = now;
                    return Ok(PurchaseStep::Rejected { value });
                }
                RejectPolicy::Abort => {
                    let refund = self.take_pending()?.inserted;
                    warn!(
                        "Rejected unsupported value {}, aborting and refunding {}",
                        value, refund
                    );
                    return Ok(PurchaseStep::Finished(
                        PurchaseResult::UnsupportedDenomination { value, refund },
                    ));
                }
            },
        };

        pending.insert(denom, now);
        debug!(
            "Slot {}: inserted {}, paid {} of {}",
            pending.slot, denom, pending.paid, pending.price
        );

        if !pending.is_paid() {
            return Ok(PurchaseStep::AwaitingPayment {
                paid: pending.paid,
                remaining: pending.remaining(),
            });
        }

        let pending = self.take_pending()?;
        let result = self.settle(pending)?;
        Ok(PurchaseStep::Finished(result))
    }

    /// Cancels the purchase in progress and refunds everything inserted.
    pub fn cancel(&mut self) -> Result<PurchaseResult> {
        let pending = self.take_pending()?;
        info!(
            "Slot {}: purchase cancelled, refunding {}",
            pending.slot, pending.inserted
        );
        Ok(PurchaseResult::UserCancelled {
            refund: pending.inserted,
        })
    }

    /// Cancels the purchase in progress if no payment input arrived within
    /// the idle timeout. Returns the cancellation result when it fires.
    pub fn expire_idle(&mut self, now: Instant) -> Option<PurchaseResult> {
        let timeout = self.idle_timeout?;
        let pending = self.pending.as_ref()?;
        if now.saturating_duration_since(pending.last_input) < timeout {
            return None;
        }

        warn!("Slot {}: payment input timed out", pending.slot);
        self.cancel().ok()
    }

    /// Runs a whole purchase from a stream of payment inputs.
    ///
    /// A stream that ends before the price is covered cancels the purchase.
    pub fn attempt_purchase<I>(&mut self, slot: u32, inputs: I) -> Result<PurchaseResult>
    where
        I: IntoIterator<Item = PaymentInput>,
    {
        if let PurchaseStep::Finished(result) = self.select(slot)? {
            return Ok(result);
        }

        for input in inputs {
            match input {
                PaymentInput::Cancel => return self.cancel(),
                PaymentInput::Insert(value) => {
                    if let PurchaseStep::Finished(result) = self.insert_money(value)? {
                        return Ok(result);
                    }
                }
            }
        }

        debug!("Slot {}: payment input ended before the price was covered", slot);
        self.cancel()
    }

    /// Replaces the whole product catalog.
    pub fn admin_replace_products(&mut self, catalog: ProductCatalog) -> Result<()> {
        self.ensure_idle()?;
        info!("Replacing product catalog ({} slots)", catalog.len());
        self.catalog = catalog;
        Ok(())
    }

    /// Replaces the whole cash ledger.
    pub fn admin_replace_cash(&mut self, ledger: CashLedger) -> Result<()> {
        self.ensure_idle()?;
        info!("Replacing cash ledger (total value {})", ledger.total_value());
        self.ledger = ledger;
        Ok(())
    }

    fn ensure_idle(&self) -> Result<()> {
        match &self.pending {
            Some(pending) => Err(VendingError::PurchaseInProgress(pending.slot)),
            None => Ok(()),
        }
    }

    fn take_pending(&mut self) -> Result<PendingPurchase> {
        self.pending.take().ok_or(VendingError::NoActivePurchase)
    }

    /// Evaluates a fully paid purchase and commits or rolls back.
    fn settle(&mut self, pending: PendingPurchase) -> Result<PurchaseResult> {
        let slot = pending.slot;
        let change_due = pending.paid - u64::from(pending.price);
        let snapshot = self.ledger.snapshot();

        // Inserted money may itself be used as change.
        if let Err(e) = self.ledger.absorb(&pending.inserted) {
            self.ledger.restore(&snapshot);
            return Err(e);
        }

        let change = match self.change_for(change_due) {
            Some(change) => change,
            None => {
                self.ledger.restore(&snapshot);
                warn!(
                    "Slot {}: cannot make change of {}, refunding {}",
                    slot, change_due, pending.inserted
                );
                return Ok(PurchaseResult::NoChangeAvailable {
                    change_due,
                    refund: pending.inserted,
                });
            }
        };

        if let Err(e) = self.commit(slot, &change) {
            self.ledger.restore(&snapshot);
            return Err(e);
        }

        info!(
            "Slot {}: sold for {}, paid {}, change {}",
            slot, pending.price, pending.paid, change
        );
        Ok(PurchaseResult::Success {
            slot,
            paid: pending.paid,
            change,
        })
    }

    fn change_for(&self, change_due: u64) -> Option<CashBundle> {
        let amount = u32::try_from(change_due).ok()?;
        compute_change(amount, self.ledger.iter())
    }

    /// Dispenses `change` and takes one unit out of stock. Stock is only
    /// touched once the ledger side succeeded.
    fn commit(&mut self, slot: u32, change: &CashBundle) -> Result<()> {
        self.ledger.dispense(change)?;
        self.catalog.decrement(slot)
    }
}
