//! # Vending Engine
//!
//! A cash vending machine: a catalog of product slots, a ledger of the
//! currency units held by the machine, and a purchase flow that computes
//! change using only the units physically present.
//!
//! ## Design Principles
//!
//! - **Bounded change**: Each unit on hand is used at most once, and the
//!   fewest-piece exact combination is chosen
//! - **All-or-nothing purchases**: A purchase either commits (stock
//!   decremented, payment absorbed, change dispensed) or leaves ledger and
//!   stock exactly as they were
//! - **Push-based flow**: Callers drive `select`, `insert_money` and
//!   `cancel`; the engine never blocks on input
//! - **Typed outcomes**: Purchase failures are `PurchaseResult` values
//!   carrying the exact refund
//!
//! ## Example
//!
//! ```
//! use vending_engine::{CashLedger, PaymentInput, Product, ProductCatalog, VendingMachine};
//!
//! let catalog = ProductCatalog::from_products([(1, Product::new("Cola", 15, 3).unwrap())]).unwrap();
//! let ledger = CashLedger::from_counts([(10, 1), (5, 3), (1, 5)]).unwrap();
//! let mut machine = VendingMachine::new(catalog, ledger);
//!
//! let result = machine.attempt_purchase(1, [PaymentInput::Insert(20)]).unwrap();
//! assert!(result.is_success());
//! ```

pub mod change;
pub mod config;
pub mod denomination;
pub mod error;
pub mod ledger;
pub mod machine;
pub mod product;
pub mod shell;
pub mod storage;
pub mod transaction;

pub use change::{can_pay, compute_change, CashBundle, ChangeCombination};
pub use config::{Config, RejectPolicy};
pub use denomination::{Denomination, DenominationKind};
pub use error::{Result, VendingError};
pub use ledger::{CashLedger, LedgerSnapshot};
pub use machine::VendingMachine;
pub use product::{Product, ProductCatalog, ProductListing};
pub use shell::Shell;
pub use transaction::{
    PaymentInput, PendingPurchase, PurchaseResult, PurchaseState, PurchaseStep, Refund,
};
