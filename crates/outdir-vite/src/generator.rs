use outdir_core::config::ProjectConfig;
use outdir_core::{ConfigGenerator, GeneratedFile, GeneratorError};

use crate::emitters;

/// Generates the Vite config that consumes the resolved output directory.
pub struct ViteConfigGenerator;

impl ConfigGenerator for ViteConfigGenerator {
    fn generate(&self, config: &ProjectConfig) -> Result<Vec<GeneratedFile>, GeneratorError> {
        config.validate()?;
        log::debug!("emitting vite.config.js with {} plugins", config.plugins.len());

        Ok(vec![GeneratedFile {
            path: "vite.config.js".to_string(),
            content: emitters::vite_config::emit_vite_config(config)?,
        }])
    }
}
