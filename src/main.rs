//! Vending machine CLI
//!
//! Loads products and cash from flat files, then runs the interactive
//! menu on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- [Goods.txt] [Wallet.txt]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `VENDING_ADMIN_PASSWORD`, `VENDING_IDLE_TIMEOUT_SECS`,
//!   `VENDING_REJECT_POLICY`: see `vending_engine::config`

use std::env;
use std::io;
use std::process;
use vending_engine::{storage, Config, Result, Shell, VendingMachine};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::from_env(env::args().skip(1))?;

    let catalog = storage::load_products(&config.goods_path)?;
    let ledger = storage::load_wallet(&config.wallet_path)?;
    let machine = VendingMachine::new(catalog, ledger).with_config(&config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(machine, config, stdin.lock(), stdout.lock());
    shell.run()
}
