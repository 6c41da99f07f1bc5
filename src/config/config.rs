use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use serde_saphyr::{from_str, to_string};

use crate::control::TunablesOverride;
use crate::errors::{Result, Error, ErrorKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    pub ring: RingConfig,
    #[serde(default)]
    pub tunables: TunablesOverride,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RingConfig {
    /// Restrict scanning to this MAC address; `None` connects to the first match.
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

const fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            ring: RingConfig {
                mac_address: None,
                reconnect_delay_ms: default_reconnect_delay_ms(),
            },
            tunables: TunablesOverride::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Read)
                .with_msg("config: Failed to read file")
                .with_ctx("path", path.display().to_string())
            )?;

        let mut config: Config = from_str(&contents)
            .map_err(|e| Error::wrap(e, ErrorKind::Parse)
                .with_msg("config: Failed to parse")
                .with_ctx("path", path.display().to_string())
            )?;

        config.path = path.to_path_buf();
        config.validate()?;

        Ok(config)
    }

    /// Loads `path`, falling back to defaults if the file does not exist yet.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path).await {
            Ok(config) => Ok(config),
            Err(e) if e.is_kind(ErrorKind::Read) => Ok(Self {
                path: path.to_path_buf(),
                ..Config::default()
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self) -> Result<()> {
        self.validate()?;

        let contents = to_string(self)
            .map_err(|e| Error::wrap(e, ErrorKind::Write)
                .with_msg("config: Failed to serialize")
            )?;

        fs::write(&self.path, &contents)
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Write)
                .with_msg("config: Failed to write file")
                .with_ctx("path", self.path.display().to_string())
            )?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(mac) = &self.ring.mac_address {
            if mac.split(':').count() != 6 {
                return Err(Error::new(ErrorKind::Parse)
                    .with_msg("config: Ring MAC address must be colon-separated")
                    .with_ctx("mac_address", mac.clone()));
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(Error::new(ErrorKind::Parse)
                    .with_msg("config: Unrecognised log level")
                    .with_ctx("log_level", other.to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_mac_address_is_rejected() {
        let mut config = Config::default();
        config.ring.mac_address = Some("not-a-mac".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = Config::default();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}
