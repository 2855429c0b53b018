use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::warn;

use crate::blockchain::ChainSettings;

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: PathBuf,
    /// Amount minted to every newly registered address.
    pub signup_grant: u64,
    pub chain: ChainSettings,
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ChainSettings::default();
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080),
            storage_dir: lookup("LEDGER_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("storage/chain_save_files")),
            signup_grant: parse_or(&lookup, "LEDGER_SIGNUP_GRANT", 100),
            chain: ChainSettings {
                base_difficulty: parse_or(
                    &lookup,
                    "LEDGER_BASE_DIFFICULTY",
                    defaults.base_difficulty,
                ),
                difficulty_step: parse_or(
                    &lookup,
                    "LEDGER_DIFFICULTY_STEP",
                    defaults.difficulty_step,
                )
                .max(1),
                batch_size: parse_or(&lookup, "LEDGER_BATCH_SIZE", defaults.batch_size).max(1),
                address_policy: parse_or(
                    &lookup,
                    "LEDGER_ADDRESS_POLICY",
                    defaults.address_policy,
                ),
            },
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("CONFIG - ignoring unparsable {key}={raw}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::LedgerConfig;
    use crate::wallet::AddressPolicy;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config(vars: &[(&str, &str)]) -> LedgerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config(&[]);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.storage_dir, PathBuf::from("storage/chain_save_files"));
        assert_eq!(cfg.signup_grant, 100);
        assert_eq!(cfg.chain.base_difficulty, 2);
        assert_eq!(cfg.chain.difficulty_step, 1000);
        assert_eq!(cfg.chain.batch_size, 3);
        assert_eq!(cfg.chain.address_policy, AddressPolicy::RecognizePending);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("LEDGER_STORAGE_DIR", "/tmp/ledger"),
            ("LEDGER_BASE_DIFFICULTY", "4"),
            ("LEDGER_BATCH_SIZE", "5"),
            ("LEDGER_ADDRESS_POLICY", "confirmed"),
        ]);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.storage_dir, PathBuf::from("/tmp/ledger"));
        assert_eq!(cfg.chain.base_difficulty, 4);
        assert_eq!(cfg.chain.batch_size, 5);
        assert_eq!(cfg.chain.address_policy, AddressPolicy::ConfirmedOnly);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = config(&[
            ("PORT", "not-a-port"),
            ("LEDGER_DIFFICULTY_STEP", "0"),
            ("LEDGER_BATCH_SIZE", "0"),
            ("LEDGER_ADDRESS_POLICY", "whenever"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.chain.difficulty_step, 1);
        assert_eq!(cfg.chain.batch_size, 1);
        assert_eq!(cfg.chain.address_policy, AddressPolicy::RecognizePending);
    }
}
