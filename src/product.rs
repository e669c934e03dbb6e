//! Product records and the slot catalog.

use crate::error::{Result, VendingError};
use std::collections::BTreeMap;

/// A product loaded into one slot.
///
/// # Invariants
///
/// - `name` is non-empty after trimming
/// - `price > 0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    name: String,
    price: u32,
    stock: u32,
}

impl Product {
    /// Validates and builds a product.
    pub fn new(name: impl Into<String>, price: u32, stock: u32) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(VendingError::InvalidProduct(
                "name must not be empty".to_string(),
            ));
        }
        if price == 0 {
            return Err(VendingError::InvalidProduct(format!(
                "price of {} must be greater than 0",
                name
            )));
        }
        Ok(Product { name, price, stock })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Returns `true` if at least one unit is in stock.
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    /// Takes one unit out of stock. Returns `false` if none are left.
    fn take_one(&mut self) -> bool {
        if !self.is_available() {
            return false;
        }
        self.stock -= 1;
        true
    }
}

/// One row of the product listing shown to buyers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListing {
    pub slot: u32,
    pub name: String,
    pub price: u32,
    pub stock: u32,
    pub available: bool,
}

/// Products indexed by slot number (1-based).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCatalog {
    slots: BTreeMap<u32, Product>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        ProductCatalog {
            slots: BTreeMap::new(),
        }
    }

    /// Builds a catalog from `(slot, product)` pairs. Later pairs replace
    /// earlier ones for the same slot.
    pub fn from_products<I>(products: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, Product)>,
    {
        let mut catalog = ProductCatalog::new();
        for (slot, product) in products {
            catalog.insert(slot, product)?;
        }
        Ok(catalog)
    }

    /// Places `product` in `slot`, returning the product it replaced.
    pub fn insert(&mut self, slot: u32, product: Product) -> Result<Option<Product>> {
        if slot == 0 {
            return Err(VendingError::InvalidSlot(slot));
        }
        Ok(self.slots.insert(slot, product))
    }

    pub fn get(&self, slot: u32) -> Option<&Product> {
        self.slots.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Highest configured slot number, if any.
    pub fn max_slot(&self) -> Option<u32> {
        self.slots.keys().next_back().copied()
    }

    /// Products ascending by slot.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Product)> + '_ {
        self.slots.iter().map(|(slot, p)| (*slot, p))
    }

    /// Listing rows ascending by slot.
    pub fn listing(&self) -> Vec<ProductListing> {
        self.iter()
            .map(|(slot, p)| ProductListing {
                slot,
                name: p.name.clone(),
                price: p.price,
                stock: p.stock,
                available: p.is_available(),
            })
            .collect()
    }

    /// Decrements the stock of `slot` by one.
    ///
    /// Fails with `UnknownSlot` or `OutOfStock`; stock never goes below zero.
    pub fn decrement(&mut self, slot: u32) -> Result<()> {
        let product = self
            .slots
            .get_mut(&slot)
            .ok_or(VendingError::UnknownSlot(slot))?;
        if product.take_one() {
            Ok(())
        } else {
            Err(VendingError::OutOfStock(slot))
        }
    }
}
