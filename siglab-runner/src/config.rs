//! TOML run configuration.
//!
//! ```toml
//! tickers = ["AAPL", "MSFT"]
//!
//! [engine]
//! short_window = 5
//! long_window = 20
//! emission = "both"
//!
//! [data]
//! data_dir = "data/bars"
//! store_dir = "data/signals"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::EngineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Engine(#[from] siglab_core::ConfigError),
}

/// Where bars are read from and signals are written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding one `{TICKER}.csv` per ticker.
    pub data_dir: PathBuf,
    /// Root of the JSONL signal store.
    pub store_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/bars"),
            store_dir: PathBuf::from("data/signals"),
        }
    }
}

/// Whether `ticker` can be used as a single file or directory name.
///
/// Rejects empty names, path separators, NUL and names starting with `.`
/// (which covers `.` and `..`).
pub fn is_safe_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && !ticker.starts_with('.')
        && !ticker.contains(['/', '\\', ':', '\0'])
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiglabConfig {
    pub engine: EngineConfig,
    pub data: DataConfig,
    pub tickers: Vec<String>,
}

impl SiglabConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Tickers upper-cased and deduplicated, in first-seen order.
    pub fn normalized_tickers(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.tickers.len());
        for t in &self.tickers {
            let t = t.trim().to_uppercase();
            if !t.is_empty() && !out.contains(&t) {
                out.push(t);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglab_core::Emission;

    #[test]
    fn unsafe_tickers_are_rejected() {
        for t in ["AAPL", "BRK.B", "^GSPC", "EURUSD=X", "BTC-USD"] {
            assert!(is_safe_ticker(t), "{t}");
        }
        for t in ["", ".", "..", "../escaped", "BRK/B", "a\\b", "C:X", ".hidden"] {
            assert!(!is_safe_ticker(t), "{t}");
        }
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = SiglabConfig::from_toml("").unwrap();
        assert_eq!(cfg, SiglabConfig::default());
        assert_eq!(cfg.engine.long_window, 20);
    }

    #[test]
    fn partial_engine_table() {
        let cfg = SiglabConfig::from_toml(
            r#"
            tickers = ["aapl", "MSFT", "AAPL "]

            [engine]
            long_window = 30
            use_quantile = true
            emission = "both"

            [data]
            store_dir = "/tmp/signals"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.engine.long_window, 30);
        assert_eq!(cfg.engine.short_window, 5);
        assert!(cfg.engine.use_quantile);
        assert_eq!(cfg.engine.emission, Emission::Both);
        assert_eq!(cfg.data.store_dir, PathBuf::from("/tmp/signals"));
        assert_eq!(cfg.data.data_dir, PathBuf::from("data/bars"));
        assert_eq!(cfg.normalized_tickers(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn invalid_engine_rejected() {
        let err = SiglabConfig::from_toml("[engine]\nshort_window = 30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Engine(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = SiglabConfig::from_toml("[engine\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
