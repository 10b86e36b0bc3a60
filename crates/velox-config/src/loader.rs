use std::path::{Path, PathBuf};

use tracing::debug;
use velox_common::{Error, Result};

use crate::model::AppConfig;

pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
        }
    }

    pub fn default_config_dir() -> PathBuf {
        let home_config = dirs::home_dir().map(|h| h.join(".velox"));
        let xdg_config = dirs::config_dir().map(|c| c.join("velox"));

        match (xdg_config, home_config) {
            (Some(xdg), Some(home)) => {
                if xdg.exists() {
                    xdg
                } else if home.exists() {
                    home
                } else {
                    // Neither exists yet: new installs go to XDG.
                    xdg
                }
            }
            (Some(xdg), None) => xdg,
            (None, Some(home)) => home,
            (None, None) => PathBuf::from(".velox"),
        }
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Directory used for the SQLite memory file unless `data_dir` is set.
    pub fn data_dir(&self, config: &AppConfig) -> PathBuf {
        config
            .data_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("data"))
    }

    /// Load the config file (YAML preferred over TOML), then fill gaps from the environment.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = self.load_file()?;
        config.apply_env();
        Ok(config)
    }

    /// The file `load` reads, if any. YAML wins when both exist.
    pub fn config_file(&self) -> Option<PathBuf> {
        ["config.yml", "config.toml"]
            .into_iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.exists())
    }

    fn load_file(&self) -> Result<AppConfig> {
        let Some(path) = self.config_file() else {
            debug!("no config file in {}, using defaults", self.config_dir.display());
            return Ok(AppConfig::default());
        };

        let contents = std::fs::read_to_string(&path)?;
        if path.extension().is_some_and(|ext| ext == "yml") {
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse YAML config: {e}")))
        } else {
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse TOML config: {e}")))
        }
    }

    pub fn ensure_dirs(&self, config: &AppConfig) -> Result<()> {
        for dir in [self.config_dir.clone(), self.data_dir(config)] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigLoader;
    use crate::model::MemoryBackend;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "velox-config-test-{}-{}-{}",
            label,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn load_file_returns_default_when_no_config_exists() {
        let dir = temp_dir("default");
        fs::create_dir_all(&dir).expect("failed to create temp dir");

        let loader = ConfigLoader::with_dir(&dir);
        let config = loader.load_file().expect("load should succeed");

        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 3000);
        assert!(config.telegram.bot_token.is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn load_prefers_yaml_over_toml_when_both_exist() {
        let dir = temp_dir("yaml-precedence");
        fs::create_dir_all(&dir).expect("failed to create temp dir");

        fs::write(
            dir.join("config.yml"),
            "gateway:\n  host: \"0.0.0.0\"\n  port: 4001\nmemory:\n  window: 6\n",
        )
        .expect("failed to write yaml config");
        fs::write(
            dir.join("config.toml"),
            "[gateway]\nhost = \"127.0.0.2\"\nport = 4999\n",
        )
        .expect("failed to write toml config");

        let loader = ConfigLoader::with_dir(&dir);
        let config = loader.load_file().expect("load should succeed");

        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.gateway.port, 4001);
        assert_eq!(config.memory.window, 6);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn load_reads_toml_when_yaml_missing() {
        let dir = temp_dir("toml");
        fs::create_dir_all(&dir).expect("failed to create temp dir");

        fs::write(
            dir.join("config.toml"),
            "[gateway]\nport = 4002\n\n[memory]\nbackend = \"memory\"\n",
        )
        .expect("failed to write toml config");

        let loader = ConfigLoader::with_dir(&dir);
        let config = loader.load_file().expect("load should succeed");

        assert_eq!(config.gateway.port, 4002);
        assert_eq!(config.memory.backend, MemoryBackend::Memory);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn config_file_reports_what_load_reads() {
        let dir = temp_dir("config-file");
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        let loader = ConfigLoader::with_dir(&dir);

        assert_eq!(loader.config_file(), None);

        fs::write(dir.join("config.toml"), "[gateway]\nport = 4003\n").expect("write");
        assert_eq!(loader.config_file(), Some(dir.join("config.toml")));

        fs::write(dir.join("config.yml"), "gateway:\n  port: 4004\n").expect("write");
        assert_eq!(loader.config_file(), Some(dir.join("config.yml")));
        assert_eq!(loader.load_file().expect("load").gateway.port, 4004);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let dir = temp_dir("bad-yaml");
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        fs::write(dir.join("config.yml"), "gateway: [unclosed").expect("write");

        let loader = ConfigLoader::with_dir(&dir);
        let err = loader.load_file().expect_err("should fail");
        assert!(err.to_string().contains("failed to parse YAML config"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn ensure_dirs_creates_config_and_data_dirs() {
        let dir = temp_dir("ensure-dirs");
        let loader = ConfigLoader::with_dir(&dir);
        let config = crate::model::AppConfig::default();

        loader.ensure_dirs(&config).expect("ensure_dirs should succeed");

        assert!(dir.exists());
        assert!(dir.join("data").exists());

        let _ = fs::remove_dir_all(dir);
    }
}
