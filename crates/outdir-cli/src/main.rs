use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use outdir_core::bundler::BundlerConfig;
use outdir_core::config::{self, CONFIG_FILE_NAME, CONTAINER_ENV, ProjectConfig};
use outdir_core::{ConfigGenerator, GeneratedFile, resolve_output_dir};
use outdir_vite::{BuildCommand, ViteConfigGenerator};

#[derive(Parser)]
#[command(
    name = "outdir",
    about = "Resolve the bundler output directory from a build target file",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the output directory, create it, and print its path
    Resolve {
        /// Print the path together with where it came from, as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the bundler config with the resolved output directory
    Config {
        /// Output format
        #[arg(long, default_value = "json")]
        format: ConfigFormat,
    },

    /// Generate vite.config.js from the project configuration
    Generate {
        /// Directory to write into (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Resolve the output directory, then run the bundler's build into it
    Build {
        /// Extra arguments passed through to the bundler
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Initialize a new outdir configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum ConfigFormat {
    Json,
    Yaml,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { json } => cmd_resolve(json),

        Commands::Config { format } => cmd_config(format),

        Commands::Generate { output, force } => cmd_generate(output, force),

        Commands::Build { args } => cmd_build(args),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "outdir", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn current_dir() -> Result<PathBuf> {
    env::current_dir().context("failed to determine the working directory")
}

/// Try to load the project config file from the given directory.
fn try_load_config(cwd: &Path) -> Result<Option<ProjectConfig>> {
    Ok(config::load_config(&cwd.join(CONFIG_FILE_NAME))?)
}

/// Write generated files under `base`, leaving existing files alone unless `force`.
fn write_files(base: &Path, files: &[GeneratedFile], force: bool) -> Result<usize> {
    let mut written = 0;
    for file in files {
        let path = base.join(&file.path);
        if path.exists() && !force {
            eprintln!("  skipped {} (exists, use --force to overwrite)", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
        written += 1;
    }
    Ok(written)
}

fn cmd_resolve(json: bool) -> Result<ExitCode> {
    let cwd = current_dir()?;
    let cfg = config::load_config_or_default(&cwd.join(CONFIG_FILE_NAME));
    let resolution = resolve_output_dir(&cwd, &cfg);

    if json {
        println!("{}", serde_json::to_string(&resolution)?);
    } else {
        println!("{}", resolution.path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(format: ConfigFormat) -> Result<ExitCode> {
    let cwd = current_dir()?;
    let cfg = try_load_config(&cwd)?.unwrap_or_default();
    let resolution = resolve_output_dir(&cwd, &cfg);

    let docker_env = env::var(CONTAINER_ENV).ok();
    let bundler = BundlerConfig::from_project(&cfg, resolution.path, docker_env.as_deref());

    match format {
        ConfigFormat::Json => {
            let json = serde_json::to_string_pretty(&bundler)?;
            println!("{}", json);
        }
        ConfigFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&bundler)?;
            print!("{}", yaml);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_generate(output: Option<PathBuf>, force: bool) -> Result<ExitCode> {
    let cwd = current_dir()?;
    let cfg = try_load_config(&cwd)?.unwrap_or_default();
    let output_dir = output.unwrap_or_else(|| cwd.clone());

    let files = ViteConfigGenerator.generate(&cfg)?;
    fs::create_dir_all(&output_dir).with_context(|| {
        format!("failed to create output directory {}", output_dir.display())
    })?;

    let written = write_files(&output_dir, &files, force)?;
    eprintln!("Generated {} of {} files in {}", written, files.len(), output_dir.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_build(args: Vec<String>) -> Result<ExitCode> {
    let cwd = current_dir()?;
    let cfg = config::load_config_or_default(&cwd.join(CONFIG_FILE_NAME));
    let resolution = resolve_output_dir(&cwd, &cfg);

    let build = BuildCommand::vite_build(&cfg.bundler, &cwd, &resolution.path, &args);
    eprintln!("Building into {}", resolution.path.display());
    log::debug!("running {}", build.display());

    let status = build
        .to_command()
        .status()
        .with_context(|| format!("failed to run `{}`", build.display()))?;

    if status.success() {
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!("  warning: `{}` exited with {}", build.display(), status);
    let code = status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
    Ok(ExitCode::from(code))
}

fn cmd_init(force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(ExitCode::SUCCESS)
}
