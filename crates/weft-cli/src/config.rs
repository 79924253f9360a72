//! Layered CLI configuration.
//!
//! Priority, lowest to highest: built-in defaults, `weft.toml` in the package
//! root (or the file named by `--config`), `WEFT_`-prefixed environment
//! variables, explicit command-line flags.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use weft_analyzer::{AnalyzerConfig, QueryOptions, config::DEFAULT_COMPONENT_DIRS};

use crate::cli::Cli;
use crate::error::ConfigError;

/// Config file looked up in the package root when `--config` is not given.
pub const CONFIG_FILE: &str = "weft.toml";

/// Directories whose features are left out of the output by default.
pub const DEFAULT_FILTER_DIRS: [&str; 3] = ["test", "tests", "demo"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Package root; file arguments are relative to it.
    pub root: PathBuf,

    /// Directory names holding installed dependencies.
    pub component_dirs: Vec<String>,

    /// Directory names never used as package entry points.
    pub exclude_dirs: Vec<String>,

    /// Features and warnings under any of these directory names are not printed.
    pub filter_dirs: Vec<String>,

    pub external_packages: bool,
    pub lazy_imports: bool,
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            component_dirs: DEFAULT_COMPONENT_DIRS.iter().map(|dir| dir.to_string()).collect(),
            exclude_dirs: AnalyzerConfig::default().exclude_dirs,
            filter_dirs: DEFAULT_FILTER_DIRS.iter().map(|dir| dir.to_string()).collect(),
            external_packages: false,
            lazy_imports: false,
            pretty: false,
        }
    }
}

/// Only the flags the user actually passed, so unset flags never mask the
/// config file or the environment.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_packages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lazy_imports: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pretty: Option<bool>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        let flag = |set: bool| set.then_some(true);
        Self {
            root: cli.root.clone(),
            external_packages: flag(cli.external_packages),
            lazy_imports: flag(cli.lazy_imports),
            pretty: flag(cli.pretty),
        }
    }
}

impl CliConfig {
    /// Load configuration from every source.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let base = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let config_file = match &cli.config {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.clone())),
            Some(path) => Some(path.clone()),
            None => {
                let default_path = base.join(CONFIG_FILE);
                default_path.is_file().then_some(default_path)
            }
        };

        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = &config_file {
            debug!(path = %path.display(), "Loading config file");
            figment = figment.merge(Toml::file(path));
        }

        // WEFT_PRETTY, WEFT_FILTER_DIRS, ...
        figment = figment
            .merge(Env::prefixed("WEFT_"))
            .merge(Serialized::defaults(CliOverrides::from(cli)));

        let config: Self = figment.extract().map_err(|error| {
            let field = if error.path.is_empty() {
                "configuration".to_string()
            } else {
                error.path.join(".")
            };
            ConfigError::InvalidValue {
                field,
                value: error.kind.to_string(),
                hint: format!("Check {CONFIG_FILE} syntax and WEFT_* environment variables"),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject directory entries that are paths rather than single names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lists = [
            ("component_dirs", &self.component_dirs),
            ("exclude_dirs", &self.exclude_dirs),
            ("filter_dirs", &self.filter_dirs),
        ];
        for (field, dirs) in lists {
            if let Some(bad) = dirs
                .iter()
                .find(|dir| dir.is_empty() || dir.contains(['/', '\\']))
            {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: format!("{bad:?}"),
                    hint: "List directory names such as \"node_modules\", not paths".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::default()
            .with_component_dirs(self.component_dirs.iter().cloned())
            .with_exclude_dirs(self.exclude_dirs.iter().cloned())
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_external_packages(self.external_packages)
            .with_lazy_imports(self.lazy_imports)
    }
}
