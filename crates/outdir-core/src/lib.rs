pub mod bundler;
pub mod config;
pub mod error;
pub mod fs;
pub mod paths;
pub mod resolve;

pub use error::{ConfigError, GeneratorError};
pub use resolve::{Resolution, ResolutionSource, Resolver, resolve_output_dir};

/// A generated file with path and content.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Trait for generators that produce bundler-side files from the project config.
pub trait ConfigGenerator {
    fn generate(
        &self,
        config: &config::ProjectConfig,
    ) -> Result<Vec<GeneratedFile>, GeneratorError>;
}
