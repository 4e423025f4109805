pub mod command;
pub mod emitters;
pub mod generator;

pub use command::{BuildCommand, OUT_DIR_ENV};
pub use generator::ViteConfigGenerator;
