//! Interactive text front end.
//!
//! Drives a [`VendingMachine`] from line-based input: a main menu, the
//! shopping flow with payment prompts, and password-gated maintenance.
//! State is saved to the data files after every sale and every
//! maintenance change.

use crate::change::CashBundle;
use crate::config::Config;
use crate::denomination::Denomination;
use crate::error::Result;
use crate::ledger::CashLedger;
use crate::machine::VendingMachine;
use crate::product::{Product, ProductCatalog};
use crate::storage;
use crate::transaction::{PaymentInput, PurchaseResult, PurchaseState, PurchaseStep};
use log::{debug, info, warn};
use std::io::{BufRead, Write};
use std::time::Instant;

/// Slots always shown in the listing and offered during product setup.
const MIN_SLOTS: u32 = 9;

/// Whether the session keeps going after a menu returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Line-driven session over any input and output.
pub struct Shell<R, W> {
    machine: VendingMachine,
    config: Config,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(machine: VendingMachine, config: Config, input: R, output: W) -> Self {
        Shell {
            machine,
            config,
            input,
            output,
        }
    }

    /// Gives back the machine, e.g. to inspect it after a session.
    pub fn into_machine(self) -> VendingMachine {
        self.machine
    }

    /// Runs the main menu until shutdown or end of input.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "=== VENDING MACHINE ===")?;

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "(b) Shopping  (m) Maintenance  (s) Shutdown")?;
            let choice = match self.prompt("Choice: ")? {
                Some(line) => line.to_lowercase(),
                None => break,
            };

            let flow = match choice.as_str() {
                "b" => self.shop()?,
                "m" => self.maintenance()?,
                "s" => self.shutdown()?,
                _ => {
                    writeln!(self.output, "Invalid selection")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                break;
            }
        }

        info!("Session ended");
        Ok(())
    }

    fn shop(&mut self) -> Result<Flow> {
        loop {
            self.show_products()?;
            let choice = match self.prompt("Slot number or 'e' to exit: ")? {
                Some(line) => line.to_lowercase(),
                None => return Ok(Flow::Exit),
            };
            if choice == "e" {
                return Ok(Flow::Continue);
            }

            let slot = match choice.parse::<u32>() {
                Ok(slot) => slot,
                Err(_) => {
                    writeln!(self.output, "Invalid selection (numbers only)")?;
                    continue;
                }
            };
            if self.machine.catalog().get(slot).is_none() {
                writeln!(self.output, "Slot {} is not configured", slot)?;
                continue;
            }

            if self.purchase(slot)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn show_products(&mut self) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "--- PRODUCTS ---")?;
        let last = self.machine.catalog().max_slot().unwrap_or(0).max(MIN_SLOTS);
        for slot in 1..=last {
            match self.machine.catalog().get(slot) {
                Some(p) => {
                    let status = if p.is_available() {
                        "Available"
                    } else {
                        "Out of stock"
                    };
                    writeln!(
                        self.output,
                        "({}) {:<20} {:>4} Baht  Qty: {:>3}  {}",
                        slot,
                        p.name(),
                        p.price(),
                        p.stock(),
                        status
                    )?;
                }
                None => writeln!(self.output, "({}) {:<20}  ---", slot, "Empty slot")?,
            }
        }
        Ok(())
    }

    fn purchase(&mut self, slot: u32) -> Result<Flow> {
        if let PurchaseStep::Finished(result) = self.machine.select(slot)? {
            self.report(&result)?;
            return Ok(Flow::Continue);
        }

        if let Some(product) = self.machine.catalog().get(slot) {
            writeln!(
                self.output,
                "Selected {} for {} Baht",
                product.name(),
                product.price()
            )?;
        }

        let options: Vec<String> = Denomination::ALL.iter().map(|d| d.to_string()).collect();
        let prompt = format!("Insert money ({}) or 'c' to cancel: ", options.join(","));

        let (result, flow) = loop {
            if let PurchaseState::CollectingPayment {
                paid, remaining, ..
            } = self.machine.state()
            {
                writeln!(self.output, "Paid: {} Baht  Remaining: {} Baht", paid, remaining)?;
            }

            let line = match self.prompt(&prompt)? {
                Some(line) => line,
                None => break (self.machine.cancel()?, Flow::Exit),
            };

            if let Some(result) = self.machine.expire_idle(Instant::now()) {
                writeln!(self.output, "Payment timed out")?;
                break (result, Flow::Continue);
            }

            match PaymentInput::parse(&line) {
                None => writeln!(self.output, "Numbers only")?,
                Some(PaymentInput::Cancel) => break (self.machine.cancel()?, Flow::Continue),
                Some(PaymentInput::Insert(value)) => match self.machine.insert_money(value)? {
                    PurchaseStep::AwaitingPayment { .. } => {}
                    PurchaseStep::Rejected { value } => writeln!(
                        self.output,
                        "Invalid denomination {}, returned",
                        value
                    )?,
                    PurchaseStep::Finished(result) => break (result, Flow::Continue),
                },
            }
        };

        self.report(&result)?;
        if result.is_success() {
            self.save()?;
        }
        Ok(flow)
    }

    fn report(&mut self, result: &PurchaseResult) -> Result<()> {
        match result {
            PurchaseResult::Success { paid, change, .. } => {
                writeln!(self.output, "Purchase successful!")?;
                writeln!(self.output, "Paid: {} Baht", paid)?;
                writeln!(self.output, "Change: {} Baht", change.total())?;
                self.write_breakdown(change)?;
            }
            PurchaseResult::OutOfStock { slot } => {
                writeln!(self.output, "Slot {} is out of stock", slot)?;
            }
            PurchaseResult::UserCancelled { refund } => {
                writeln!(self.output, "Payment cancelled")?;
                self.write_refund(refund)?;
            }
            PurchaseResult::UnsupportedDenomination { value, refund } => {
                writeln!(self.output, "Invalid denomination {}, purchase aborted", value)?;
                self.write_refund(refund)?;
            }
            PurchaseResult::NoChangeAvailable { change_due, refund } => {
                writeln!(
                    self.output,
                    "Transaction failed: no change available for {} Baht",
                    change_due
                )?;
                self.write_refund(refund)?;
            }
        }
        Ok(())
    }

    fn write_refund(&mut self, refund: &CashBundle) -> Result<()> {
        if refund.is_empty() {
            writeln!(self.output, "No money was taken")?;
            return Ok(());
        }
        writeln!(self.output, "Refunding {} Baht:", refund.total())?;
        self.write_breakdown(refund)
    }

    /// Notes first, then coins, each ascending.
    fn write_breakdown(&mut self, bundle: &CashBundle) -> Result<()> {
        let notes: Vec<_> = bundle.notes().collect();
        let coins: Vec<_> = bundle.coins().collect();
        if !notes.is_empty() {
            writeln!(self.output, "  BANKNOTES:")?;
            for (denom, count) in notes {
                writeln!(self.output, "    {} Baht x {} notes", denom, count)?;
            }
        }
        if !coins.is_empty() {
            writeln!(self.output, "  COINS:")?;
            for (denom, count) in coins {
                writeln!(self.output, "    {} Baht x {} coins", denom, count)?;
            }
        }
        Ok(())
    }

    fn maintenance(&mut self) -> Result<Flow> {
        match self.authenticate("Password: ")? {
            None => return Ok(Flow::Exit),
            Some(false) => return Ok(Flow::Continue),
            Some(true) => {}
        }

        loop {
            writeln!(self.output)?;
            writeln!(
                self.output,
                "(g) Setup products  (w) Setup cash  (c) Exit maintenance"
            )?;
            let choice = match self.prompt("Operation: ")? {
                Some(line) => line.to_lowercase(),
                None => return Ok(Flow::Exit),
            };
            let flow = match choice.as_str() {
                "g" => self.setup_products()?,
                "w" => self.setup_cash()?,
                "c" => return Ok(Flow::Continue),
                _ => {
                    writeln!(self.output, "Invalid selection")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn setup_products(&mut self) -> Result<Flow> {
        writeln!(self.output, "Leave name empty to skip a slot")?;
        let mut catalog = ProductCatalog::new();

        for slot in 1..=MIN_SLOTS {
            let name = match self.prompt(&format!("Product name for slot {}: ", slot))? {
                Some(name) => name,
                None => return Ok(Flow::Exit),
            };
            if name.is_empty() {
                continue;
            }
            let price = match self.prompt("Price (>= 1 Baht): ")? {
                Some(line) => line,
                None => return Ok(Flow::Exit),
            };
            let stock = match self.prompt("Initial stock (>= 0): ")? {
                Some(line) => line,
                None => return Ok(Flow::Exit),
            };

            let product = match (price.parse::<u32>(), stock.parse::<u32>()) {
                (Ok(price), Ok(stock)) => Product::new(name, price, stock),
                _ => {
                    writeln!(self.output, "Invalid input, skipping this slot")?;
                    continue;
                }
            };
            match product {
                Ok(product) => {
                    catalog.insert(slot, product)?;
                }
                Err(e) => writeln!(self.output, "{}, skipping this slot", e)?,
            }
        }

        self.machine.admin_replace_products(catalog)?;
        self.save()?;
        writeln!(self.output, "Products saved")?;
        Ok(Flow::Continue)
    }

    fn setup_cash(&mut self) -> Result<Flow> {
        writeln!(self.output, "Leave blank for zero")?;
        let mut ledger = CashLedger::new();

        for denom in Denomination::ALL {
            loop {
                let raw = match self.prompt(&format!("{} Baht count: ", denom))? {
                    Some(line) => line,
                    None => return Ok(Flow::Exit),
                };
                if raw.is_empty() {
                    break;
                }
                match raw.parse::<i64>() {
                    Ok(n) if n < 0 => writeln!(self.output, "Must be >= 0")?,
                    Ok(n) => match u32::try_from(n) {
                        Ok(count) => {
                            ledger.add(denom, count)?;
                            break;
                        }
                        Err(_) => writeln!(self.output, "Count too large")?,
                    },
                    Err(_) => writeln!(self.output, "Numbers only")?,
                }
            }
        }

        self.machine.admin_replace_cash(ledger)?;
        self.save()?;
        writeln!(self.output, "Cash saved")?;
        Ok(Flow::Continue)
    }

    fn shutdown(&mut self) -> Result<Flow> {
        match self.authenticate("Shutdown password: ")? {
            None => Ok(Flow::Exit),
            Some(false) => Ok(Flow::Continue),
            Some(true) => {
                writeln!(self.output, "System shutdown complete")?;
                Ok(Flow::Exit)
            }
        }
    }

    /// Returns `None` on end of input.
    fn authenticate(&mut self, label: &str) -> Result<Option<bool>> {
        let password = match self.prompt(label)? {
            Some(line) => line,
            None => return Ok(None),
        };
        if password == self.config.admin_password {
            writeln!(self.output, "ACCESS GRANTED")?;
            Ok(Some(true))
        } else {
            warn!("Rejected admin password");
            writeln!(self.output, "ACCESS DENIED")?;
            Ok(Some(false))
        }
    }

    fn save(&mut self) -> Result<()> {
        storage::save_products(&self.config.goods_path, self.machine.catalog())?;
        storage::save_wallet(&self.config.wallet_path, self.machine.ledger())?;
        debug!(
            "Saved state to {} and {}",
            self.config.goods_path.display(),
            self.config.wallet_path.display()
        );
        Ok(())
    }

    /// Writes `label` and reads one trimmed line. Returns `None` at end of
    /// input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Session {
        output: String,
        machine: VendingMachine,
        _dir: tempfile::TempDir,
    }

    fn run_session(catalog: ProductCatalog, ledger: CashLedger, input: &str) -> Session {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            goods_path: dir.path().join("Goods.txt"),
            wallet_path: dir.path().join("Wallet.txt"),
            ..Config::default()
        };
        let machine = VendingMachine::new(catalog, ledger).with_config(&config);

        let mut output = Vec::new();
        let mut shell = Shell::new(machine, config, Cursor::new(input.to_string()), &mut output);
        shell.run().unwrap();
        let machine = shell.into_machine();

        Session {
            output: String::from_utf8(output).unwrap(),
            machine,
            _dir: dir,
        }
    }

    fn cola_machine() -> (ProductCatalog, CashLedger) {
        let catalog =
            ProductCatalog::from_products([(1, Product::new("Cola", 15, 2).unwrap())]).unwrap();
        let ledger = CashLedger::from_counts([(5, 1)]).unwrap();
        (catalog, ledger)
    }

    #[test]
    fn test_purchase_with_change() {
        let (catalog, ledger) = cola_machine();
        let session = run_session(catalog, ledger, "b\n1\n20\ne\n");

        assert!(session.output.contains("Purchase successful!"));
        assert!(session.output.contains("Change: 5 Baht"));
        assert!(session.output.contains("5 Baht x 1 coins"));
        assert_eq!(session.machine.catalog().get(1).unwrap().stock(), 1);
    }

    #[test]
    fn test_cancel_reports_refund() {
        let (catalog, ledger) = cola_machine();
        let session = run_session(catalog, ledger, "b\n1\n10\nc\ne\n");

        assert!(session.output.contains("Payment cancelled"));
        assert!(session.output.contains("Refunding 10 Baht:"));
        assert_eq!(session.machine.catalog().get(1).unwrap().stock(), 2);
    }

    #[test]
    fn test_non_numeric_payment_reprompts() {
        let (catalog, ledger) = cola_machine();
        let session = run_session(catalog, ledger, "b\n1\nabc\n10\n5\ne\n");

        assert!(session.output.contains("Numbers only"));
        assert!(session.output.contains("Purchase successful!"));
    }

    #[test]
    fn test_maintenance_requires_password() {
        let (catalog, ledger) = cola_machine();
        let session = run_session(catalog, ledger, "m\nwrong\n");

        assert!(session.output.contains("ACCESS DENIED"));
        assert!(!session.output.contains("Setup products"));
    }

    #[test]
    fn test_setup_cash_replaces_ledger() {
        let (catalog, ledger) = cola_machine();
        let input = "m\n1234\nw\n10\n-1\n3\n\n\nx\n\n\n\n\n\n\nc\n";
        let session = run_session(catalog, ledger, input);

        let d = |v| Denomination::new(v).unwrap();
        assert!(session.output.contains("Must be >= 0"));
        assert!(session.output.contains("Numbers only"));
        assert_eq!(session.machine.ledger().count(d(1)), 10);
        assert_eq!(session.machine.ledger().count(d(2)), 3);
        assert_eq!(session.machine.ledger().count(d(5)), 0);
    }

    #[test]
    fn test_shutdown_with_wrong_password_continues() {
        let (catalog, ledger) = cola_machine();
        let session = run_session(catalog, ledger, "s\nnope\ns\n1234\nb\n");

        assert!(session.output.contains("ACCESS DENIED"));
        assert!(session.output.contains("System shutdown complete"));
        assert!(!session.output.contains("--- PRODUCTS ---"));
    }
}
