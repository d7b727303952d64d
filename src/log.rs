//! Leveled logging façade, §1.2/§4.6.
//!
//! [`Logger`] is a [`log::Log`] implementation, but it is never installed
//! as the process-wide logger: each session owns one through
//! [`SessionLog`], and call sites log through that handle
//! (`log.debug(...)`, `log.info(...)`, `log.warn(...)`, `log.error(...)`)
//! rather than the global `log::debug!`/`log::info!`/`log::error!`
//! macros, which would be silently discarded by the crate's default
//! `Off` max level with no global logger installed.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use log::{Level, Log, Metadata, Record};
use time::OffsetDateTime;

/// Per-session logging configuration, mirroring the `console_log`,
/// `utc_log`, and `log_file` fields of [`crate::config::LBSessionParams`].
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub log_file: Option<String>,
    pub console: bool,
    pub utc: bool,
}

/// A [`log::Log`] sink for one session. INFO/DEBUG go to stdout when
/// `console` is set (or when there is no log file at all); ERROR goes to
/// stderr under the same condition. Every level is appended to the log
/// file, timestamped, when one is configured. DEBUG records are dropped
/// entirely in release builds (`cfg!(debug_assertions)`), matching the
/// compile-time gate required by §4.6.
pub struct Logger {
    file: Option<Mutex<File>>,
    console: bool,
    utc: bool,
}

impl Logger {
    pub fn new(config: &LogConfig) -> std::io::Result<Self> {
        let file = match &config.log_file {
            Some(path) => Some(Mutex::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
            None => None,
        };
        Ok(Self {
            console: config.console || file.is_none(),
            utc: config.utc,
            file,
        })
    }

    fn timestamp(&self) -> String {
        let now = if self.utc {
            OffsetDateTime::now_utc()
        } else {
            OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
        };
        now.format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| String::from("<unknown time>"))
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if !cfg!(debug_assertions) && metadata.level() == Level::Debug {
            return false;
        }
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] [{}] {}", self.timestamp(), record.level(), record.args());

        if self.console {
            if record.level() == Level::Error {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }

        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{line}");
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// An owned handle a worker threads through its call stack instead of
/// relying on a single process-wide logger — one `Logger` per session,
/// never a shared global.
pub struct SessionLog {
    logger: Logger,
}

impl SessionLog {
    pub fn new(config: &LogConfig) -> std::io::Result<Self> {
        Ok(Self {
            logger: Logger::new(config)?,
        })
    }

    pub fn debug(&self, args: std::fmt::Arguments) {
        self.logger.log(
            &Record::builder()
                .args(args)
                .level(Level::Debug)
                .target("ethlb")
                .build(),
        );
    }

    pub fn info(&self, args: std::fmt::Arguments) {
        self.logger.log(
            &Record::builder()
                .args(args)
                .level(Level::Info)
                .target("ethlb")
                .build(),
        );
    }

    pub fn warn(&self, args: std::fmt::Arguments) {
        self.logger.log(
            &Record::builder()
                .args(args)
                .level(Level::Warn)
                .target("ethlb")
                .build(),
        );
    }

    pub fn error(&self, args: std::fmt::Arguments) {
        self.logger.log(
            &Record::builder()
                .args(args)
                .level(Level::Error)
                .target("ethlb")
                .build(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_defaults_on_when_no_log_file_configured() {
        let logger = Logger::new(&LogConfig::default()).unwrap();
        assert!(logger.console);
    }

    #[test]
    fn writes_to_configured_log_file() {
        let dir = std::env::temp_dir().join(format!("ethlb-log-test-{}", std::process::id()));
        let path = dir.to_string_lossy().into_owned();
        let config = LogConfig {
            log_file: Some(path.clone()),
            console: false,
            utc: true,
        };
        let log = SessionLog::new(&config).unwrap();
        log.info(format_args!("hello from test"));
        log.logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("hello from test"));
        assert!(contents.contains("INFO"));
        let _ = std::fs::remove_file(&path);
    }
}
