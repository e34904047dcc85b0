use std::{env, path::PathBuf, str::FromStr};

use crate::error::ConfigErr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// Process settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Where the training CSV lives, there's no fallback location.
    pub data_path: Option<PathBuf>,
    /// Makes initialization, resets and shuffles reproducible.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_path: None,
            seed: None,
        }
    }
}

impl Config {
    /// Reads `HOST`, `PORT`, `DATA_PATH` and `SEED` from the environment.
    ///
    /// # Errors
    /// Returns a `ConfigErr` if `PORT` or `SEED` are set but can't be parsed.
    pub fn from_env() -> Result<Self, ConfigErr> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigErr>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            data_path: lookup("DATA_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            seed: parse_var(&lookup, "SEED")?,
        })
    }

    /// The address the HTTP listener binds to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigErr>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };

    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigErr::InvalidVar { name, value })
}
