use std::{env, fs, path::PathBuf};

use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tui::keybindings::KeyBinding;

const CONFIG: &str = include_str!("../.config/config.json5");

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    /// Environment variable that overrides `service.base_url`
    pub static ref SERVICE_URL_ENV: String = format!("{}_SERVICE_URL", PROJECT_NAME.clone());
    /// Environment variable naming an alternative config file
    pub static ref CONFIG_PATH_ENV: String = format!("{}_CONFIG", PROJECT_NAME.clone());
}

/// Paths of the service operations, relative to the base URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub upload: String,
    pub describe: String,
    pub tail: String,
    pub plot: String,
    pub train: String,
    pub fillna: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            upload: "/upload".to_string(),
            describe: "/describe".to_string(),
            tail: "/tail".to_string(),
            plot: "/plot".to_string(),
            train: "/train".to_string(),
            fillna: "/fillna".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            user_agent: default_user_agent(),
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// `dark` or `light`
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub keybindings: Vec<KeyBinding>,
}

impl Config {
    /// Defaults compiled into the binary
    pub fn embedded() -> Result<Self, config::ConfigError> {
        json5::from_str(CONFIG).map_err(|e| config::ConfigError::Message(e.to_string()))
    }

    /// Load configuration.
    ///
    /// Layers, lowest first: embedded defaults, the user file (`config_path`,
    /// else `$STATLENS_CONFIG`, else `~/.statlens-config.json5`, which is
    /// created from the defaults when missing), then `$STATLENS_SERVICE_URL`.
    /// Default keybindings are kept for any key the user file does not bind.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let defaults = Self::embedded()?;

        let explicit = config_path
            .cloned()
            .or_else(|| env::var(CONFIG_PATH_ENV.as_str()).ok().map(PathBuf::from));
        let selected_path = match &explicit {
            Some(p) => expand_tilde(p),
            None => {
                let home_cfg = default_home_config_path();
                if !home_cfg.exists() {
                    if let Some(parent) = home_cfg.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    let _ = fs::write(&home_cfg, CONFIG);
                }
                home_cfg
            }
        };
        debug!(path = %selected_path.display(), "loading config");

        let builder = config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5))
            .add_source(
                config::File::from(selected_path)
                    .format(config::FileFormat::Json5)
                    .required(explicit.is_some()),
            )
            .set_override_option("service.base_url", env::var(SERVICE_URL_ENV.as_str()).ok())?;

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        cfg.merge_default_keybindings(&defaults);
        Ok(cfg)
    }

    /// Replace the service URL, e.g. from the command line
    pub fn with_service_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.service.base_url = url;
        }
        self
    }

    fn merge_default_keybindings(&mut self, defaults: &Config) {
        for binding in &defaults.keybindings {
            if !self.keybindings.iter().any(|b| b.key == binding.key) {
                self.keybindings.push(binding.clone());
            }
        }
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str()
        && s.starts_with('~')
        && let Some(base) = BaseDirs::new()
    {
        return PathBuf::from(s.replacen('~', base.home_dir().to_str().unwrap_or(""), 1));
    }
    path.clone()
}

fn default_home_config_path() -> PathBuf {
    let file_name = format!(".{}-config.json5", env!("CARGO_PKG_NAME"));
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(file_name);
    }
    PathBuf::from(file_name)
}
