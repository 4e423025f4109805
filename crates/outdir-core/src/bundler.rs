use std::path::PathBuf;

use serde::Serialize;

use crate::config::{PluginSpec, ProjectConfig};

/// The configuration object handed to the bundler, in its own key casing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    pub base: String,
    pub plugins: Vec<PluginSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerOptions>,
    pub build: BuildOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub watch: WatchOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchOptions {
    pub use_polling: bool,
    /// Polling interval in milliseconds.
    pub interval: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    pub out_dir: PathBuf,
    pub empty_out_dir: bool,
}

impl BundlerConfig {
    /// Build the bundler config from project settings and an already resolved
    /// output directory. `docker_env` is the value of `DOCKER`, if any.
    pub fn from_project(project: &ProjectConfig, out_dir: PathBuf, docker_env: Option<&str>) -> Self {
        let server = project.server.as_ref().map(|server| ServerOptions {
            host: server.host.clone(),
            port: server.port,
            watch: WatchOptions {
                use_polling: server.watch.policy.use_polling(docker_env),
                interval: server.watch.interval_ms,
            },
        });

        Self {
            base: project.base.clone(),
            plugins: project.plugins.clone(),
            server,
            build: BuildOptions {
                out_dir,
                empty_out_dir: project.empty_out_dir,
            },
        }
    }
}
