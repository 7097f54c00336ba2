use super::types::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let irisdesk_dir = home.join(".irisdesk");

        if !irisdesk_dir.exists() {
            fs::create_dir_all(&irisdesk_dir).context("Failed to create .irisdesk directory")?;
        }

        Self::load_or_init_at(&irisdesk_dir.join("config.toml"))
    }

    /// Load `config_path`, writing defaults there first if it does not exist.
    pub fn load_or_init_at(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path.to_path_buf();
            config
        } else {
            let config = Config {
                config_path: config_path.to_path_buf(),
                ..Config::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
