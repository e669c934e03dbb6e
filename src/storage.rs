//! Flat-file persistence for products and cash.
//!
//! Both files are comma-separated without a header row. Lines starting with
//! `#` are comments.
//!
//! ```text
//! # num,name,price,stock        # denom,count
//! 1,Cola,15,10                  1,20
//! 2,Water,10,5                  5,10
//! ```
//!
//! Loading is lenient: rows that fail to parse or validate are logged at
//! warn level and skipped, and a missing file loads as empty.

use crate::denomination::Denomination;
use crate::error::{Result, VendingError};
use crate::ledger::CashLedger;
use crate::product::{Product, ProductCatalog};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

const GOODS_HEADER: &str = "# num,name,price,stock";
const WALLET_HEADER: &str = "# denom,count";

/// One product row.
#[derive(Debug, Deserialize, Serialize)]
struct ProductRecord {
    slot: u32,
    name: String,
    price: u32,
    stock: u32,
}

/// One wallet row.
#[derive(Debug, Deserialize, Serialize)]
struct CashRecord {
    denomination: Denomination,
    count: u32,
}

/// Reads records and hands each one, with its line number, to `apply`.
fn for_each_record<R, T, F>(reader: R, mut apply: F) -> Result<()>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
    F: FnMut(T, usize) -> Result<()>,
{
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut raw = StringRecord::new();
    let mut row = 0;
    loop {
        match csv_reader.read_record(&mut raw) {
            Ok(false) => break,
            Ok(true) => {
                row = raw.position().map_or(row + 1, |p| p.line() as usize);
                match raw.deserialize::<T>(None) {
                    Ok(record) => {
                        if let Err(e) = apply(record, row) {
                            warn!("Row {}: {}", row, e);
                        }
                    }
                    Err(e) => warn!(
                        "{}",
                        VendingError::InvalidRecord {
                            row,
                            message: e.to_string(),
                        }
                    ),
                }
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                row += 1;
                warn!("Row {}: CSV parse error: {}", row, e);
            }
        }
    }

    Ok(())
}

/// Parses a product catalog.
pub fn read_products<R: Read>(reader: R) -> Result<ProductCatalog> {
    let mut catalog = ProductCatalog::new();

    for_each_record(reader, |record: ProductRecord, row| {
        let product = Product::new(record.name, record.price, record.stock)?;
        if catalog.insert(record.slot, product)?.is_some() {
            warn!("Row {}: Duplicate slot {}, later row wins", row, record.slot);
        }
        Ok(())
    })?;

    debug!("Loaded {} products", catalog.len());
    Ok(catalog)
}

/// Parses a cash ledger.
pub fn read_wallet<R: Read>(reader: R) -> Result<CashLedger> {
    let mut ledger = CashLedger::new();
    let mut seen = BTreeSet::new();

    for_each_record(reader, |record: CashRecord, row| {
        let denom = record.denomination;
        if !seen.insert(denom) {
            warn!(
                "Row {}: Duplicate denomination {}, later row wins",
                row, denom
            );
            let current = ledger.count(denom);
            ledger.remove(denom, current)?;
        }
        ledger.add(denom, record.count)
    })?;

    debug!("Loaded cash worth {}", ledger.total_value());
    Ok(ledger)
}

/// Writes the catalog ascending by slot, preceded by a comment header.
pub fn write_products<W: Write>(catalog: &ProductCatalog, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", GOODS_HEADER)?;
    let mut csv_writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for (slot, product) in catalog.iter() {
        csv_writer.serialize(ProductRecord {
            slot,
            name: product.name().to_string(),
            price: product.price(),
            stock: product.stock(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes one row per catalog denomination, including zero counts.
pub fn write_wallet<W: Write>(ledger: &CashLedger, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", WALLET_HEADER)?;
    let mut csv_writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for denom in Denomination::ALL {
        csv_writer.serialize(CashRecord {
            denomination: denom,
            count: ledger.count(denom),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Loads the product file, or an empty catalog if it does not exist.
pub fn load_products(path: &Path) -> Result<ProductCatalog> {
    match open(path)? {
        Some(file) => read_products(BufReader::new(file)),
        None => Ok(ProductCatalog::new()),
    }
}

/// Loads the wallet file, or an empty ledger if it does not exist.
pub fn load_wallet(path: &Path) -> Result<CashLedger> {
    match open(path)? {
        Some(file) => read_wallet(BufReader::new(file)),
        None => Ok(CashLedger::new()),
    }
}

pub fn save_products(path: &Path, catalog: &ProductCatalog) -> Result<()> {
    let file = File::create(path)?;
    write_products(catalog, BufWriter::new(file))
}

pub fn save_wallet(path: &Path, ledger: &CashLedger) -> Result<()> {
    let file = File::create(path)?;
    write_wallet(ledger, BufWriter::new(file))
}

fn open(path: &Path) -> Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("File {} not found, starting empty", path.display());
            Ok(None)
        }
        Err(e) => Err(VendingError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn d(value: u32) -> Denomination {
        Denomination::new(value).unwrap()
    }

    #[test]
    fn test_read_products_skips_comments_and_bad_rows() {
        let data = "# num,name,price,stock
1,Cola,15,10

2, Water , 10, 5
3,Broken,abc,1
4,Free,0,1
5,TooFew,1
0,NoSlot,5,5
";
        let catalog = read_products(Cursor::new(data)).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().name(), "Cola");
        assert_eq!(catalog.get(2).unwrap().name(), "Water");
        assert_eq!(catalog.get(2).unwrap().stock(), 5);
    }

    #[test]
    fn test_read_products_later_duplicate_wins() {
        let data = "1,Cola,15,10\n1,Tea,20,3\n";
        let catalog = read_products(Cursor::new(data)).unwrap();
        assert_eq!(catalog.get(1).unwrap().name(), "Tea");
    }

    #[test]
    fn test_read_wallet_rejects_unknown_denominations() {
        let data = "# denom,count
1,20
3,4
20,-1
100,2
100,5
";
        let ledger = read_wallet(Cursor::new(data)).unwrap();

        assert_eq!(ledger.count(d(1)), 20);
        assert_eq!(ledger.count(d(20)), 0);
        assert_eq!(ledger.count(d(100)), 5);
        assert_eq!(ledger.total_value(), 520);
    }

    #[test]
    fn test_read_wallet_duplicate_after_zero_row_replaces() {
        let data = "5,0\n5,4\n10,2\n10,0\n";
        let ledger = read_wallet(Cursor::new(data)).unwrap();

        assert_eq!(ledger.count(d(5)), 4);
        assert_eq!(ledger.count(d(10)), 0);
        assert_eq!(ledger.total_value(), 20);
    }

    #[test]
    fn test_write_products_format() {
        let catalog = ProductCatalog::from_products([
            (2, Product::new("Water", 10, 5).unwrap()),
            (1, Product::new("Cola", 15, 10).unwrap()),
        ])
        .unwrap();

        let mut out = Vec::new();
        write_products(&catalog, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "# num,name,price,stock\n1,Cola,15,10\n2,Water,10,5\n");
    }

    #[test]
    fn test_write_wallet_lists_every_denomination() {
        let ledger = CashLedger::from_counts([(5, 3), (500, 1)]).unwrap();

        let mut out = Vec::new();
        write_wallet(&ledger, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("# denom,count\n1,0\n"));
        assert!(text.contains("\n5,3\n"));
        assert!(text.contains("\n500,1\n"));
        assert_eq!(text.lines().count(), 10);

        assert_eq!(read_wallet(Cursor::new(text)).unwrap(), ledger);
    }

    #[test]
    fn test_name_with_comma_survives_save_and_load() {
        let catalog =
            ProductCatalog::from_products([(1, Product::new("Chips, salted", 25, 2).unwrap())])
                .unwrap();

        let mut out = Vec::new();
        write_products(&catalog, &mut out).unwrap();
        assert_eq!(read_products(Cursor::new(out)).unwrap(), catalog);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Goods.txt");

        assert!(load_products(&path).unwrap().is_empty());
        assert!(load_wallet(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let goods = dir.path().join("Goods.txt");
        let wallet = dir.path().join("Wallet.txt");

        let catalog =
            ProductCatalog::from_products([(3, Product::new("Tea", 12, 4).unwrap())]).unwrap();
        let ledger = CashLedger::from_counts([(10, 7)]).unwrap();

        save_products(&goods, &catalog).unwrap();
        save_wallet(&wallet, &ledger).unwrap();

        assert_eq!(load_products(&goods).unwrap(), catalog);
        assert_eq!(load_wallet(&wallet).unwrap(), ledger);
    }
}
