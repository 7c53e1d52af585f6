//! Configuration loading and validation for the `solace` CLI.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use zeroize::Zeroizing;

/// Prompt shown when the passphrase is read from the terminal.
pub const PASSPHRASE_PROMPT: &str = "Enter passphrase: ";

/// Validated CLI configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Passphrase used to derive the file key. Prompted for when unset.
    #[serde(rename = "solace_passphrase", default)]
    pub passphrase: Option<Zeroizing<String>>,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build solace configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to parse solace configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.passphrase.as_ref().is_some_and(|p| p.is_empty()) {
            bail!("SOLACE_PASSPHRASE must not be empty");
        }
        Ok(())
    }

    /// The passphrase from `SOLACE_PASSPHRASE`, or whatever `prompt` reads
    /// when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt fails or yields an empty passphrase.
    pub fn passphrase<F>(&self, prompt: F) -> Result<Zeroizing<String>>
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        let passphrase = match &self.passphrase {
            Some(p) => p.clone(),
            None => Zeroizing::new(prompt().context("failed to read passphrase")?),
        };
        if passphrase.is_empty() {
            bail!("passphrase must not be empty");
        }
        Ok(passphrase)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .field("log_level", &self.log_level)
            .finish()
    }
}
