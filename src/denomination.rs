//! The fixed catalog of currency units the machine recognizes.
//!
//! Values are whole baht. Coins and notes differ only in how they are
//! grouped for display.

use crate::error::{Result, VendingError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Physical form of a denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenominationKind {
    Coin,
    Note,
}

/// A legal unit of currency.
///
/// Can only be constructed from a value in the catalog, so holding a
/// `Denomination` proves the value is accepted by the machine.
///
/// # Examples
///
/// ```
/// use vending_engine::{Denomination, DenominationKind};
///
/// let twenty = Denomination::new(20).unwrap();
/// assert_eq!(twenty.value(), 20);
/// assert_eq!(twenty.kind(), DenominationKind::Note);
/// assert!(Denomination::new(3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Denomination(u32);

impl Denomination {
    /// Coin values, ascending.
    pub const COINS: [u32; 4] = [1, 2, 5, 10];

    /// Note values, ascending.
    pub const NOTES: [u32; 5] = [20, 50, 100, 500, 1000];

    /// Every denomination, ascending.
    pub const ALL: [Denomination; 9] = [
        Denomination(1),
        Denomination(2),
        Denomination(5),
        Denomination(10),
        Denomination(20),
        Denomination(50),
        Denomination(100),
        Denomination(500),
        Denomination(1000),
    ];

    /// Looks up `value` in the catalog.
    pub fn new(value: u32) -> Result<Self> {
        if Self::is_legal(value) {
            Ok(Denomination(value))
        } else {
            Err(VendingError::InvalidDenomination(value))
        }
    }

    /// Returns `true` if `value` is part of the catalog.
    pub fn is_legal(value: u32) -> bool {
        Self::COINS.contains(&value) || Self::NOTES.contains(&value)
    }

    /// Face value in whole units.
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn kind(self) -> DenominationKind {
        if Self::COINS.contains(&self.0) {
            DenominationKind::Coin
        } else {
            DenominationKind::Note
        }
    }

    pub fn is_coin(self) -> bool {
        self.kind() == DenominationKind::Coin
    }
}

impl FromStr for Denomination {
    type Err = VendingError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<u32>()
            .map_err(|_| VendingError::InvalidInput(format!("not a denomination: {:?}", trimmed)))?;
        Denomination::new(value)
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Denomination {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for Denomination {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u32::deserialize(deserializer)?;
        Denomination::new(value).map_err(serde::de::Error::custom)
    }
}
