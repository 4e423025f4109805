//! Build output directory resolution.
//!
//! A build target file in the working directory may name the directory the
//! bundler writes into. Its whole content, trimmed, is one path; absolute
//! paths are used as-is and relative ones are taken from the working
//! directory. Without a usable target the fallback directory is used. The
//! chosen directory is created before it is returned. Nothing here fails:
//! every problem degrades to the fallback path with a warning.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::config::ProjectConfig;
use crate::fs::{FileSystem, OsFileSystem};
use crate::paths;

/// Environment variable overriding the build target file name.
pub const TARGET_FILE_ENV: &str = "BUILD_TARGET_FILE";

/// Build target file name used when [`TARGET_FILE_ENV`] is unset or empty.
pub const DEFAULT_TARGET_FILE: &str = ".build-target";

/// Output directory used when no target is configured or usable.
pub const FALLBACK_OUT_DIR: &str = "dist";

/// Pick the build target file name: the environment value if set and non-empty.
pub fn indirection_file_name<'a>(env_value: Option<&'a str>, default: &'a str) -> &'a str {
    match env_value {
        Some(name) if !name.is_empty() => name,
        _ => default,
    }
}

/// Read the build target file and turn its content into an absolute directory.
///
/// Returns `None` when the file is missing, unreadable, or blank.
pub fn read_indirection(fs: &impl FileSystem, cwd: &Path, file_name: &str) -> Option<PathBuf> {
    let target_file = paths::absolutize(cwd, Path::new(file_name));
    if !fs.exists(&target_file) {
        debug!("no build target file at {}", target_file.display());
        return None;
    }

    let contents = match fs.read_to_string(&target_file) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(
                "failed to read build target file \"{}\": {err}; ignoring it",
                target_file.display()
            );
            return None;
        }
    };

    let target = contents.trim();
    if target.is_empty() {
        debug!("build target file {} is empty", target_file.display());
        return None;
    }

    Some(paths::absolutize(cwd, Path::new(target)))
}

/// Where a resolved directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Named by the build target file.
    TargetFile,
    /// No usable build target; the fallback directory was chosen up front.
    Fallback,
    /// The chosen directory could not be created; fell back afterwards.
    CreateFailed,
}

/// The outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub path: PathBuf,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Resolves the build output directory against a working directory.
#[derive(Debug, Clone)]
pub struct Resolver<F = OsFileSystem> {
    fs: F,
    target_file: String,
    fallback_dir: String,
}

impl Resolver<OsFileSystem> {
    /// Resolver over the real filesystem with the default names.
    pub fn new() -> Self {
        Self::with_fs(OsFileSystem)
    }
}

impl Default for Resolver<OsFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Resolver<F> {
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs,
            target_file: DEFAULT_TARGET_FILE.to_string(),
            fallback_dir: FALLBACK_OUT_DIR.to_string(),
        }
    }

    /// Resolver using the target file and fallback names from project config.
    pub fn from_config(fs: F, config: &ProjectConfig) -> Self {
        Self::with_fs(fs)
            .target_file(&config.target_file)
            .fallback_dir(&config.fallback_dir)
    }

    /// Override the default build target file name.
    pub fn target_file(mut self, name: impl Into<String>) -> Self {
        self.target_file = name.into();
        self
    }

    /// Override the fallback directory name.
    pub fn fallback_dir(mut self, dir: impl Into<String>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    /// The fallback directory resolved against `cwd`.
    pub fn fallback_path(&self, cwd: &Path) -> PathBuf {
        paths::absolutize(cwd, Path::new(&self.fallback_dir))
    }

    /// Resolve the output directory and make sure it exists.
    ///
    /// `cwd` must be absolute. `env_target_file` is the value of
    /// [`TARGET_FILE_ENV`], if any.
    pub fn resolve(&self, cwd: &Path, env_target_file: Option<&str>) -> Resolution {
        let file_name = indirection_file_name(env_target_file, &self.target_file);
        let fallback = self.fallback_path(cwd);

        let (candidate, source) = match read_indirection(&self.fs, cwd, file_name) {
            Some(path) => (path, ResolutionSource::TargetFile),
            None => (fallback.clone(), ResolutionSource::Fallback),
        };

        match self.fs.create_dir_all(&candidate) {
            Ok(()) => {
                debug!("build output directory: {}", candidate.display());
                Resolution {
                    path: candidate,
                    source,
                }
            }
            Err(err) => {
                warn!(
                    "failed to ensure build output directory \"{}\": {err}; falling back to \"{}\"",
                    candidate.display(),
                    fallback.display()
                );
                // One attempt at the fallback; the bundler creates it again on write.
                if candidate != fallback {
                    if let Err(err) = self.fs.create_dir_all(&fallback) {
                        warn!(
                            "failed to create fallback output directory \"{}\": {err}",
                            fallback.display()
                        );
                    }
                }
                Resolution {
                    path: fallback,
                    source: ResolutionSource::CreateFailed,
                }
            }
        }
    }
}

/// Resolve the output directory for `cwd` with the project's names, using the
/// real filesystem and the process environment.
pub fn resolve_output_dir(cwd: &Path, config: &ProjectConfig) -> Resolution {
    let env_value = std::env::var(TARGET_FILE_ENV).ok();
    Resolver::from_config(OsFileSystem, config).resolve(cwd, env_value.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    /// Records log output per thread, so parallel tests see only their own.
    mod capture {
        use std::cell::RefCell;
        use std::sync::Once;

        use log::{Level, LevelFilter, Log, Metadata, Record};

        thread_local! {
            static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
        }

        struct CaptureLogger;

        impl Log for CaptureLogger {
            fn enabled(&self, _: &Metadata) -> bool {
                true
            }

            fn log(&self, record: &Record) {
                RECORDS.with(|records| {
                    records
                        .borrow_mut()
                        .push((record.level(), record.args().to_string()))
                });
            }

            fn flush(&self) {}
        }

        static LOGGER: CaptureLogger = CaptureLogger;
        static INIT: Once = Once::new();

        /// Run `f` and return its result with the warnings it logged.
        pub fn warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
            INIT.call_once(|| {
                log::set_logger(&LOGGER).expect("no other logger in this test binary");
                log::set_max_level(LevelFilter::Trace);
            });
            RECORDS.with(|records| records.borrow_mut().clear());
            let out = f();
            let warnings = RECORDS.with(|records| {
                records
                    .borrow_mut()
                    .drain(..)
                    .filter(|(level, _)| *level == Level::Warn)
                    .map(|(_, message)| message)
                    .collect()
            });
            (out, warnings)
        }
    }

    const CWD: &str = "/project";

    fn cwd() -> &'static Path {
        Path::new(CWD)
    }

    #[test]
    fn test_indirection_file_name() {
        assert_eq!(indirection_file_name(None, ".build-target"), ".build-target");
        assert_eq!(indirection_file_name(Some(""), ".build-target"), ".build-target");
        assert_eq!(indirection_file_name(Some(".out"), ".build-target"), ".out");
    }

    #[test]
    fn test_missing_target_file_uses_fallback() {
        let fs = MemoryFileSystem::new().with_dir(CWD);
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/dist"));
        assert_eq!(resolution.source, ResolutionSource::Fallback);
        assert!(fs.is_dir(Path::new("/project/dist")));
    }

    #[test]
    fn test_blank_target_file_uses_fallback() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", " \n\t\n");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/dist"));
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[test]
    fn test_absolute_target_passes_through() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "/a/b/c");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/a/b/c"));
        assert_eq!(resolution.source, ResolutionSource::TargetFile);
        assert!(fs.is_dir(Path::new("/a/b/c")));
    }

    #[test]
    fn test_target_is_trimmed() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "/srv/output\n");
        let path = Resolver::with_fs(&fs).resolve(cwd(), None).into_path();
        assert_eq!(path, PathBuf::from("/srv/output"));
        assert!(fs.is_dir(Path::new("/srv/output")));
    }

    #[test]
    fn test_relative_target_resolves_against_cwd() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "out/sub");
        let path = Resolver::with_fs(&fs).resolve(cwd(), None).into_path();
        assert_eq!(path, PathBuf::from("/project/out/sub"));
    }

    #[test]
    fn test_relative_target_with_parent_segments() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "../plugins/web\n");
        let path = Resolver::with_fs(&fs).resolve(cwd(), None).into_path();
        assert_eq!(path, PathBuf::from("/plugins/web"));
    }

    #[test]
    fn test_repeated_resolution_is_idempotent() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "out");
        let resolver = Resolver::with_fs(&fs);
        let first = resolver.resolve(cwd(), None);
        let second = resolver.resolve(cwd(), None);
        assert_eq!(first, second);
        assert_eq!(second.source, ResolutionSource::TargetFile);
        assert_eq!(fs.create_calls(), 2);
    }

    #[test]
    fn test_create_failure_falls_back() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/blocker", "not a directory")
            .with_file("/project/.build-target", "blocker/out");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/dist"));
        assert_eq!(resolution.source, ResolutionSource::CreateFailed);
        // The fallback gets one creation attempt
        assert!(fs.is_dir(Path::new("/project/dist")));
        assert_eq!(fs.create_calls(), 2);
    }

    #[test]
    fn test_fallback_also_failing_still_returns_fallback() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/.build-target", "/locked/out")
            .deny_under("/locked")
            .deny_under("/project/dist");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/dist"));
        assert_eq!(resolution.source, ResolutionSource::CreateFailed);
        assert!(!fs.is_dir(Path::new("/project/dist")));
    }

    #[test]
    fn test_successful_resolution_logs_no_warning() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "out");
        let (_, warnings) = capture::warnings(|| Resolver::with_fs(&fs).resolve(cwd(), None));
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_create_failure_warning_names_path_and_cause() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/blocker", "not a directory")
            .with_file("/project/.build-target", "blocker/out");
        let (resolution, warnings) =
            capture::warnings(|| Resolver::with_fs(&fs).resolve(cwd(), None));

        assert_eq!(resolution.source, ResolutionSource::CreateFailed);
        assert_eq!(warnings.len(), 1, "warnings: {warnings:?}");
        assert!(warnings[0].contains("\"/project/blocker/out\""));
        assert!(warnings[0].contains("/project/blocker is not a directory"));
        assert!(warnings[0].contains("falling back to \"/project/dist\""));
    }

    #[test]
    fn test_fallback_failure_logs_second_warning() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/.build-target", "/locked/out")
            .deny_under("/locked")
            .deny_under("/project/dist");
        let (_, warnings) = capture::warnings(|| Resolver::with_fs(&fs).resolve(cwd(), None));

        assert_eq!(warnings.len(), 2, "warnings: {warnings:?}");
        assert!(warnings[0].contains("\"/locked/out\""));
        assert!(warnings[0].contains("permission denied: /locked/out"));
        assert!(warnings[1].contains("fallback output directory \"/project/dist\""));
        assert!(warnings[1].contains("permission denied: /project/dist"));
    }

    #[test]
    fn test_unreadable_target_file_warns() {
        let fs = MemoryFileSystem::new().with_dir("/project/.build-target");
        let (_, warnings) = capture::warnings(|| Resolver::with_fs(&fs).resolve(cwd(), None));
        assert_eq!(warnings.len(), 1, "warnings: {warnings:?}");
        assert!(warnings[0].contains("\"/project/.build-target\""));
    }

    #[test]
    fn test_fallback_creation_failure_is_not_retried() {
        let fs = MemoryFileSystem::new().deny_under("/project");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/dist"));
        assert_eq!(resolution.source, ResolutionSource::CreateFailed);
        assert_eq!(fs.create_calls(), 1);
    }

    #[test]
    fn test_env_file_name_overrides_default() {
        let fs = MemoryFileSystem::new()
            .with_file("/project/.build-target", "/ignored")
            .with_file("/project/ci/target.txt", "/ci/out\n");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), Some("ci/target.txt"));
        assert_eq!(resolution.path, PathBuf::from("/ci/out"));
    }

    #[test]
    fn test_empty_env_file_name_uses_default() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "/from/default");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), Some(""));
        assert_eq!(resolution.path, PathBuf::from("/from/default"));
    }

    #[test]
    fn test_unreadable_target_file_is_ignored() {
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", vec![0xffu8, 0x00]);
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/dist"));
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[test]
    fn test_target_file_that_is_a_directory_is_ignored() {
        let fs = MemoryFileSystem::new().with_dir("/project/.build-target");
        let resolution = Resolver::with_fs(&fs).resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/dist"));
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[test]
    fn test_from_config_names() {
        let config = ProjectConfig {
            target_file: ".out-path".to_string(),
            fallback_dir: "build/web".to_string(),
            ..ProjectConfig::default()
        };
        let fs = MemoryFileSystem::new().with_file("/project/.build-target", "/ignored");
        let resolver = Resolver::from_config(&fs, &config);
        assert_eq!(resolver.fallback_path(cwd()), PathBuf::from("/project/build/web"));
        let resolution = resolver.resolve(cwd(), None);
        assert_eq!(resolution.path, PathBuf::from("/project/build/web"));
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }
}
