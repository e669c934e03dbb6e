//! Error types for the vending engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, VendingError>;

/// Errors that can occur during machine operation.
///
/// Purchase outcomes such as "out of stock" or "no change available" are not
/// errors; they are reported through [`crate::PurchaseResult`].
#[derive(Error, Debug)]
pub enum VendingError {
    /// Failed to open, read or write a data file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid record in a data file
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Value is not part of the denomination catalog
    #[error("Invalid denomination: {0}")]
    InvalidDenomination(u32),

    /// Attempt to remove more units than the ledger holds
    #[error("Insufficient cash: requested {requested} x {denomination}, only {available} on hand")]
    InsufficientCash {
        denomination: u32,
        requested: u32,
        available: u32,
    },

    /// Adding units would overflow the stored count
    #[error("Count overflow for denomination {0}")]
    CountOverflow(u32),

    /// Product fields failed validation
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Slot numbers start at 1
    #[error("Invalid slot: {0}")]
    InvalidSlot(u32),

    /// No product configured in the slot
    #[error("Slot {0} is not configured")]
    UnknownSlot(u32),

    /// Stock decrement on an empty slot
    #[error("Slot {0} is out of stock")]
    OutOfStock(u32),

    /// A purchase is already collecting payment
    #[error("A purchase is already in progress for slot {0}")]
    PurchaseInProgress(u32),

    /// Payment input arrived while no purchase was active
    #[error("No purchase in progress")]
    NoActivePurchase,

    /// Text that could not be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bad configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
