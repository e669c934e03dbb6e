//! Runtime configuration.
//!
//! Data file paths come from positional arguments; the remaining settings
//! come from environment variables:
//!
//! - `VENDING_ADMIN_PASSWORD`: password for maintenance and shutdown
//! - `VENDING_IDLE_TIMEOUT_SECS`: seconds without payment input before a
//!   purchase is cancelled, `0` disables the timeout
//! - `VENDING_REJECT_POLICY`: `abort` or `reprompt`

use crate::error::{Result, VendingError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_ADMIN_PASSWORD: &str = "VENDING_ADMIN_PASSWORD";
pub const ENV_IDLE_TIMEOUT: &str = "VENDING_IDLE_TIMEOUT_SECS";
pub const ENV_REJECT_POLICY: &str = "VENDING_REJECT_POLICY";

/// What happens when a value outside the catalog is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectPolicy {
    /// End the purchase and refund everything inserted so far.
    #[default]
    Abort,

    /// Hand back the rejected unit and keep collecting.
    Reprompt,
}

impl FromStr for RejectPolicy {
    type Err = VendingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(RejectPolicy::Abort),
            "reprompt" => Ok(RejectPolicy::Reprompt),
            other => Err(VendingError::InvalidConfig(format!(
                "unknown reject policy {:?} (expected abort or reprompt)",
                other
            ))),
        }
    }
}

/// Settings for one machine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub goods_path: PathBuf,
    pub wallet_path: PathBuf,
    pub admin_password: String,
    /// `None` disables the idle-input timeout.
    pub idle_timeout: Option<Duration>,
    pub reject_policy: RejectPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            goods_path: PathBuf::from("Goods.txt"),
            wallet_path: PathBuf::from("Wallet.txt"),
            admin_password: "1234".to_string(),
            idle_timeout: Some(Duration::from_secs(120)),
            reject_policy: RejectPolicy::Abort,
        }
    }
}

impl Config {
    /// Builds the configuration from command-line arguments (program name
    /// excluded) and the process environment.
    pub fn from_env<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_sources(args, |key| env::var(key).ok())
    }

    /// Builds the configuration from arguments and a variable lookup.
    pub fn from_sources<I, F>(args: I, lookup: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        let args: Vec<String> = args.into_iter().collect();
        if args.len() > 2 {
            return Err(VendingError::InvalidConfig(
                "usage: vending-machine [goods-file] [wallet-file]".to_string(),
            ));
        }
        if let Some(goods) = args.first() {
            config.goods_path = PathBuf::from(goods);
        }
        if let Some(wallet) = args.get(1) {
            config.wallet_path = PathBuf::from(wallet);
        }

        if let Some(password) = lookup(ENV_ADMIN_PASSWORD) {
            if password.is_empty() {
                return Err(VendingError::InvalidConfig(format!(
                    "{} must not be empty",
                    ENV_ADMIN_PASSWORD
                )));
            }
            config.admin_password = password;
        }

        if let Some(raw) = lookup(ENV_IDLE_TIMEOUT) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                VendingError::InvalidConfig(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_IDLE_TIMEOUT, raw
                ))
            })?;
            config.idle_timeout = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }

        if let Some(raw) = lookup(ENV_REJECT_POLICY) {
            config.reject_policy = raw.parse()?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(args: &[&str], vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_sources(args.iter().map(|a| a.to_string()), |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[], &[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.admin_password, "1234");
        assert_eq!(config.reject_policy, RejectPolicy::Abort);
    }

    #[test]
    fn test_positional_paths() {
        let config = config_with(&["g.txt", "w.txt"], &[]).unwrap();
        assert_eq!(config.goods_path, PathBuf::from("g.txt"));
        assert_eq!(config.wallet_path, PathBuf::from("w.txt"));

        assert!(config_with(&["a", "b", "c"], &[]).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let config = config_with(
            &[],
            &[
                (ENV_ADMIN_PASSWORD, "s3cret"),
                (ENV_IDLE_TIMEOUT, "30"),
                (ENV_REJECT_POLICY, "Reprompt"),
            ],
        )
        .unwrap();

        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.reject_policy, RejectPolicy::Reprompt);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = config_with(&[], &[(ENV_IDLE_TIMEOUT, "0")]).unwrap();
        assert_eq!(config.idle_timeout, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            config_with(&[], &[(ENV_IDLE_TIMEOUT, "soon")]),
            Err(VendingError::InvalidConfig(_))
        ));
        assert!(matches!(
            config_with(&[], &[(ENV_REJECT_POLICY, "ignore")]),
            Err(VendingError::InvalidConfig(_))
        ));
        assert!(matches!(
            config_with(&[], &[(ENV_ADMIN_PASSWORD, "")]),
            Err(VendingError::InvalidConfig(_))
        ));
    }
}
