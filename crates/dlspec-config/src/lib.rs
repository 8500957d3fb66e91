//! `dlspec.toml` loading and `tracing` initialization for the `dlspec` tools.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once, OnceLock, PoisonError};

use dlspec::CompilationKind;
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable naming an explicit config file.
pub const DLSPEC_CONFIG_ENV_VAR: &str = "DLSPEC_CONFIG";

/// File name looked up when no explicit config is given.
pub const CONFIG_FILE_NAME: &str = "dlspec.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid dlspec.toml: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` embeds a snippet of the input; the message alone is enough.
        ConfigError::Toml(err.message().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DlspecConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub specification: SpecificationConfig,
}

impl DlspecConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,

    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to this file. If it cannot be opened, file logging is
    /// skipped and the other sinks stay active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// Maps a bare level name (case-insensitive, `warning` accepted) to its
    /// canonical spelling. Anything else is passed through as directives.
    pub(crate) fn normalize_level_directives(input: &str) -> String {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

        let directives = input.trim();
        if directives.is_empty() {
            return Self::default_level();
        }
        if directives.eq_ignore_ascii_case("warning") {
            return "warn".to_owned();
        }
        LEVELS
            .iter()
            .find(|level| directives.eq_ignore_ascii_case(level))
            .map_or_else(|| directives.to_owned(), |level| (*level).to_owned())
    }

    fn fallback_filter() -> EnvFilter {
        EnvFilter::default().add_directive(LevelFilter::INFO.into())
    }

    /// The effective filter: the configured directives, with `RUST_LOG`
    /// appended when set. Unparseable directives fall back to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let configured = Self::normalize_level_directives(&self.level);
        let from_env = std::env::var("RUST_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let candidates = match from_env {
            Some(env) => {
                let env = env.trim();
                vec![format!("{configured},{env}"), env.to_owned(), configured]
            }
            None => vec![configured],
        };
        candidates
            .into_iter()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(Self::fallback_filter)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilationSetting {
    #[default]
    Program,
    Library,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecificationConfig {
    /// Minimum API level used when resolving a document.
    #[serde(default = "SpecificationConfig::default_min_api_level")]
    pub min_api_level: u32,

    #[serde(default)]
    pub compilation: CompilationSetting,

    /// Pretty-print exported documents.
    #[serde(default)]
    pub pretty: bool,
}

impl SpecificationConfig {
    fn default_min_api_level() -> u32 {
        1
    }

    pub fn compilation_kind(&self) -> CompilationKind {
        match self.compilation {
            CompilationSetting::Program => CompilationKind::Program,
            CompilationSetting::Library => CompilationKind::Library,
        }
    }
}

impl Default for SpecificationConfig {
    fn default() -> Self {
        Self {
            min_api_level: Self::default_min_api_level(),
            compilation: CompilationSetting::default(),
            pretty: false,
        }
    }
}

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `f` while holding the config environment lock.
///
/// Tests that set [`DLSPEC_CONFIG_ENV_VAR`] wrap the mutation and the
/// discovery in this helper so concurrent discovery never observes it.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Finds the config file for `dir`.
///
/// Search order:
/// 1) `DLSPEC_CONFIG` (absolute or relative to `dir`)
/// 2) `dlspec.toml` in `dir`
pub fn discover_config_path(dir: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(DLSPEC_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            dir.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    let path = dir.join(CONFIG_FILE_NAME);
    path.is_file()
        .then(|| path.canonicalize().unwrap_or(path))
}

/// Loads the config for `dir`, or the default when there is none.
pub fn load_for_dir(dir: &Path) -> Result<(DlspecConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(dir) else {
        return Ok((DlspecConfig::default(), None));
    };
    let config = DlspecConfig::load_from_path(&path)?;
    tracing::debug!(target: "dlspec.config", path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}

struct MutexFileMakeWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl<'a> MakeWriter<'a> for MutexFileMakeWriter {
    type Writer = MutexFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        MutexFileWriter {
            guard: self.file.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

struct MutexFileWriter<'a> {
    guard: std::sync::MutexGuard<'a, std::fs::File>,
}

impl Write for MutexFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard.flush()
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber described by `config`.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let file = config.file.as_ref().and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        let file_open_failed = config.file.is_some() && file.is_none();

        let mut make_writer = if config.stderr {
            BoxMakeWriter::new(io::stderr)
        } else {
            BoxMakeWriter::new(io::sink)
        };
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(MutexFileMakeWriter {
                file: Arc::new(Mutex::new(file)),
            }));
        }

        let layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() && file_open_failed {
            if let Some(path) = config.file.as_ref() {
                tracing::warn!(
                    target: "dlspec.config",
                    path = %path.display(),
                    "failed to open log file; file logging is disabled"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_directives_are_normalized() {
        assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
        assert_eq!(
            LoggingConfig::normalize_level_directives("dlspec.parser=debug"),
            "dlspec.parser=debug"
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = DlspecConfig::load_from_str("").unwrap();
        assert_eq!(config, DlspecConfig::default());
        assert!(config.logging.stderr);
        assert_eq!(config.specification.min_api_level, 1);
        assert_eq!(
            config.specification.compilation_kind(),
            CompilationKind::Program
        );
    }

    #[test]
    fn toml_errors_do_not_echo_input() {
        let err = DlspecConfig::load_from_str("[logging]\nlevel = 3\n").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("invalid dlspec.toml: "), "{message}");
        assert!(!message.contains("level = 3"), "{message}");
    }
}
