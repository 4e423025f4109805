use std::path::{Path, PathBuf};

/// Environment variable through which `outdir build` hands the resolved
/// directory to the generated config, so it is not resolved twice.
pub const OUT_DIR_ENV: &str = "OUTDIR_OUT_DIR";

/// A bundler invocation ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub current_dir: PathBuf,
}

impl BuildCommand {
    /// `npx <bundler> build --outDir <out_dir> <extra...>` run from `cwd`.
    ///
    /// The resolved directory goes both on the command line and through
    /// [`OUT_DIR_ENV`]; `emptyOutDir` stays with the config file.
    pub fn vite_build(bundler: &str, cwd: &Path, out_dir: &Path, extra: &[String]) -> Self {
        let out_dir = out_dir.display().to_string();
        let mut args = vec![
            bundler.to_string(),
            "build".to_string(),
            "--outDir".to_string(),
            out_dir.clone(),
        ];
        args.extend(extra.iter().cloned());

        Self {
            program: "npx".to_string(),
            args,
            envs: vec![(OUT_DIR_ENV.to_string(), out_dir)],
            current_dir: cwd.to_path_buf(),
        }
    }

    pub fn to_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .current_dir(&self.current_dir);
        command
    }

    /// Shell-like rendering for progress output.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}
