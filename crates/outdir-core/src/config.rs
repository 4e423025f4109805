use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resolve::{DEFAULT_TARGET_FILE, FALLBACK_OUT_DIR};

/// Top-level project configuration loaded from `.outdir.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Name of the build target file, relative to the working directory.
    /// `BUILD_TARGET_FILE` takes precedence when set.
    pub target_file: String,
    /// Output directory used when no build target is configured or usable.
    pub fallback_dir: String,
    /// Bundler package invoked by `outdir build`.
    pub bundler: String,
    /// Public base path for served and built assets.
    pub base: String,
    pub plugins: Vec<PluginSpec>,
    /// Clear the output directory before each build. Off by default so builds
    /// add to whatever the target already holds.
    pub empty_out_dir: bool,
    /// Dev-server settings. `null` selects the build-only variant.
    pub server: Option<ServerConfig>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            target_file: DEFAULT_TARGET_FILE.to_string(),
            fallback_dir: FALLBACK_OUT_DIR.to_string(),
            bundler: "vite".to_string(),
            base: "./".to_string(),
            plugins: PluginSpec::defaults(),
            empty_out_dir: false,
            server: Some(ServerConfig::default()),
        }
    }
}

impl ProjectConfig {
    /// Reject values the resolver or the emitters cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_file.trim().is_empty() {
            return Err(ConfigError::Invalid("target_file must not be empty".into()));
        }
        if self.fallback_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("fallback_dir must not be empty".into()));
        }
        if self.bundler.trim().is_empty() {
            return Err(ConfigError::Invalid("bundler must not be empty".into()));
        }
        for plugin in &self.plugins {
            if plugin.module.trim().is_empty() || plugin.factory.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "plugin entries need both module and factory (got module {:?}, factory {:?})",
                    plugin.module, plugin.factory
                )));
            }
        }
        if let Some(ref server) = self.server {
            if server.watch.interval_ms == 0 {
                return Err(ConfigError::Invalid(
                    "server.watch.interval_ms must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A bundler plugin registered in the plugin list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginSpec {
    /// Module specifier to import from.
    pub module: String,
    /// Exported factory called to create the plugin instance.
    pub factory: String,
    #[serde(default)]
    pub import: ImportStyle,
    /// Options object passed to the factory, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<IndexMap<String, serde_json::Value>>,
}

impl PluginSpec {
    /// The UI-framework plugin followed by the companion loader.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                module: "@vitejs/plugin-vue".to_string(),
                factory: "vue".to_string(),
                import: ImportStyle::Default,
                options: None,
            },
            Self {
                module: "@disguise-one/designer-pythonapi/vite-loader".to_string(),
                factory: "designerPythonLoader".to_string(),
                import: ImportStyle::Named,
                options: None,
            },
        ]
    }
}

/// How a plugin factory is imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStyle {
    /// `import factory from 'module'`
    Default,
    /// `import { factory } from 'module'`
    #[default]
    Named,
}

/// Dev-server settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub watch: WatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5173,
            watch: WatchConfig::default(),
        }
    }
}

/// File-watch settings for the dev server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    pub policy: WatchPolicy,
    /// Polling interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            policy: WatchPolicy::Always,
            interval_ms: 1000,
        }
    }
}

/// When the dev server polls for changes instead of using native notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchPolicy {
    #[default]
    Always,
    Never,
    /// Poll only inside a container, detected by `DOCKER=true`.
    Container,
}

/// Environment variable set to `true` inside the project's containers.
pub const CONTAINER_ENV: &str = "DOCKER";

impl WatchPolicy {
    /// Decide polling given the value of [`CONTAINER_ENV`].
    pub fn use_polling(self, docker_env: Option<&str>) -> bool {
        match self {
            WatchPolicy::Always => true,
            WatchPolicy::Never => false,
            WatchPolicy::Container => docker_env == Some("true"),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".outdir.yaml";

/// Load and validate config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ProjectConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    log::debug!("loaded config from {}", path.display());
    Ok(Some(config))
}

/// Load config for resolution, where nothing may be fatal: a missing file
/// gives the defaults, and a broken one gives the defaults plus a warning.
pub fn load_config_or_default(path: &Path) -> ProjectConfig {
    match load_config(path) {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            log::warn!("{err}; using default settings");
            ProjectConfig::default()
        }
    }
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# outdir configuration
target_file: .build-target   # file whose trimmed content names the output directory
fallback_dir: dist           # used when the target file is missing, empty, or unusable
bundler: vite                # package run by `outdir build`

base: ./
empty_out_dir: false

plugins:
  - module: "@vitejs/plugin-vue"
    factory: vue
    import: default
  - module: "@disguise-one/designer-pythonapi/vite-loader"
    factory: designerPythonLoader
    import: named

server:                      # set to null for a build-only config
  host: 0.0.0.0
  port: 5173
  watch:
    policy: always           # always | never | container (polls when DOCKER=true)
    interval_ms: 1000
"#
}
