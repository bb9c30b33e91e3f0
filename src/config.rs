use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::game::DEFAULT_PLAYER_COUNT;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    /// JSON store file; `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,
    pub player_count: usize,
    /// Fixed seed for reproducible shuffles.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            data_path: None,
            player_count: DEFAULT_PLAYER_COUNT,
            seed: None,
        }
    }
}

impl Config {
    /// Reads `RANDOMATCHED_*` variables; the first CLI argument overrides the
    /// bind address.
    pub fn from_env() -> Result<Self> {
        let vars = |key: &str| env::var(key).ok();
        let mut config = Self::from_lookup(vars)?;
        if let Some(bind) = env::args().nth(1) {
            config.bind_addr = bind;
        }
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(bind) = lookup("RANDOMATCHED_BIND") {
            config.bind_addr = bind;
        }
        config.data_path = lookup("RANDOMATCHED_DATA")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if let Some(raw) = lookup("RANDOMATCHED_PLAYERS") {
            config.player_count = raw
                .trim()
                .parse()
                .with_context(|| format!("RANDOMATCHED_PLAYERS={raw:?} is not a number"))?;
        }
        if let Some(raw) = lookup("RANDOMATCHED_SEED") {
            config.seed = Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("RANDOMATCHED_SEED={raw:?} is not a u64"))?,
            );
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let n = self.player_count;
        if n < 2 || n % 2 != 0 || n > usize::from(u8::MAX) {
            bail!("player count must be an even number between 2 and 254, got {n}");
        }
        Ok(())
    }
}
