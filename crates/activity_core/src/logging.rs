//! Process-wide logging bootstrap.
//!
//! Both the server binary and tests route `log` records through one
//! `flexi_logger` backend, written either to stderr or to size-rotated files.
//!
//! # Invariants
//! - The backend is started at most once per process.
//! - A second `init_logging` call with the same settings is a no-op; with
//!   different settings it is an error, and the running backend is kept.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FILE_BASENAME: &str = "activity_tracker";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_MESSAGE_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Destination for log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Rotating files under an absolute directory, created on demand.
    Directory(PathBuf),
}

impl LogTarget {
    /// Validates `dir` as a file target. Empty and relative paths are refused.
    pub fn directory(dir: &str) -> Result<Self, String> {
        let dir = dir.trim();
        if dir.is_empty() {
            return Err("log directory cannot be empty".to_string());
        }
        let path = Path::new(dir);
        if !path.is_absolute() {
            return Err(format!("log directory must be absolute, got `{dir}`"));
        }
        Ok(Self::Directory(path.to_path_buf()))
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

struct ActiveLogger {
    level: LevelFilter,
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Starts the logging backend.
///
/// `level` is one of `trace`, `debug`, `info`, `warn`, `error` (any case).
///
/// # Errors
/// - Unknown level, or `off`.
/// - Log directory cannot be created, or the backend fails to start.
/// - Logging is already running with a different level or target.
pub fn init_logging(level: &str, target: LogTarget) -> Result<(), String> {
    let level = parse_level(level)?;

    let active = ACTIVE.get_or_try_init(|| {
        let handle = start_backend(level, &target)?;
        PANIC_HOOK.get_or_init(install_panic_hook);
        info!(
            "event=logging_init module=core status=ok level={} target={} version={} os={}",
            level.as_str().to_ascii_lowercase(),
            target,
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS
        );
        Ok::<_, String>(ActiveLogger {
            level,
            target: target.clone(),
            _handle: handle,
        })
    })?;

    if active.level != level || active.target != target {
        return Err(format!(
            "logging already running with level `{}` at `{}`; cannot switch to `{}` at `{}`",
            active.level, active.target, level, target
        ));
    }
    Ok(())
}

/// Level and target of the running backend, if any.
pub fn logging_status() -> Option<(LevelFilter, LogTarget)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.target.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    let raw = raw.trim();
    match LevelFilter::from_str(raw) {
        Ok(LevelFilter::Off) | Err(_) => Err(format!(
            "unknown log level `{raw}`; use trace, debug, info, warn or error"
        )),
        Ok(level) => Ok(level),
    }
}

fn start_backend(level: LevelFilter, target: &LogTarget) -> Result<LoggerHandle, String> {
    let spec = level.as_str().to_ascii_lowercase();
    let logger = Logger::try_with_str(&spec).map_err(|err| format!("bad log spec `{spec}`: {err}"))?;

    let logger = match target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(FILE_BASENAME))
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };

    logger
        .start()
        .map_err(|err| format!("cannot start logger: {err}"))
}

fn install_panic_hook() {
    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic module=core status=error location={location} message={}",
            panic_message(info)
        );
        chained(info);
    }));
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");
    single_line(message, PANIC_MESSAGE_LIMIT)
}

/// Flattens control characters to spaces and caps length at `limit` chars.
fn single_line(message: &str, limit: usize) -> String {
    let mut flattened: String = message
        .chars()
        .take(limit)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if message.chars().nth(limit).is_some() {
        flattened.push_str("...");
    }
    flattened
}
