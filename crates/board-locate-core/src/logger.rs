//! Stderr logging for the CLI and for ad-hoc debugging.
//!
//! A filter is a comma-separated list of directives, each either a bare level
//! or `target=level`, e.g. `warn,board_locate_template=debug`. The longest
//! matching target prefix decides; the bare level covers everything else.
//! Library code only talks to the `log` facade.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LogSpecError {
    #[error("unknown log level '{0}'")]
    Level(String),
    #[error("empty target in log directive '{0}'")]
    EmptyTarget(String),
}

#[derive(thiserror::Error, Debug)]
pub enum LogInitError {
    #[error("another global logger is already installed")]
    AlreadyInstalled,
}

/// Per-target level filter parsed from a directive list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    targets: Vec<(String, LevelFilter)>,
}

impl LogFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            targets: Vec::new(),
        }
    }

    /// Override the level for `target` and every module below it.
    pub fn with_target(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        self.targets.push((target.into(), level));
        // Longest prefix first so the first hit is the most specific.
        self.targets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .find(|(prefix, _)| {
                target == prefix.as_str()
                    || target
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            })
            .map_or(self.default, |(_, level)| *level)
    }

    /// Most verbose level any target can reach.
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, l)| *l)
            .fold(self.default, std::cmp::max)
    }
}

impl FromStr for LogFilter {
    type Err = LogSpecError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let level = |s: &str| {
            s.trim()
                .parse::<LevelFilter>()
                .map_err(|_| LogSpecError::Level(s.trim().to_string()))
        };
        let mut filter = LogFilter::new(LevelFilter::Warn);
        for directive in spec.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((target, lvl)) => {
                    let target = target.trim();
                    if target.is_empty() {
                        return Err(LogSpecError::EmptyTarget(directive.to_string()));
                    }
                    filter = filter.with_target(target, level(lvl)?);
                }
                None => filter.default = level(directive)?,
            }
        }
        Ok(filter)
    }
}

struct StderrSink {
    filter: LogFilter,
    started: Instant,
}

impl Log for StderrSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let ms = self.started.elapsed().as_millis();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{ms:>7}ms {:<5} {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static SINK: OnceLock<StderrSink> = OnceLock::new();

/// Install the stderr sink as the global `log` logger.
///
/// Only the first call installs anything; later calls keep the first filter.
pub fn init_logger(filter: LogFilter) -> Result<(), LogInitError> {
    if SINK.get().is_some() {
        return Ok(());
    }
    let max = filter.max_level();
    let sink = SINK.get_or_init(|| StderrSink {
        filter,
        started: Instant::now(),
    });
    log::set_logger(sink).map_err(|_| LogInitError::AlreadyInstalled)?;
    log::set_max_level(max);
    Ok(())
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over `directives`; an
/// unparsable `directives` falls back to `info`.
#[cfg(feature = "tracing")]
pub fn init_tracing(directives: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_sets_default() {
        let f: LogFilter = "DEBUG".parse().expect("spec");
        assert_eq!(f.level_for("anything"), LevelFilter::Debug);
        assert_eq!(f.max_level(), LevelFilter::Debug);
    }

    #[test]
    fn most_specific_target_wins() {
        let f: LogFilter = "warn, board_locate_contour=debug, board_locate_contour::scoring=trace"
            .parse()
            .expect("spec");
        assert_eq!(f.level_for("board_locate_template"), LevelFilter::Warn);
        assert_eq!(f.level_for("board_locate_contour"), LevelFilter::Debug);
        assert_eq!(f.level_for("board_locate_contour::detector"), LevelFilter::Debug);
        assert_eq!(f.level_for("board_locate_contour::scoring"), LevelFilter::Trace);
        // Prefix must end on a module boundary.
        assert_eq!(f.level_for("board_locate_contours"), LevelFilter::Warn);
        assert_eq!(f.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn empty_spec_defaults_to_warn() {
        assert_eq!("".parse::<LogFilter>(), Ok(LogFilter::new(LevelFilter::Warn)));
    }

    #[test]
    fn bad_directives_are_rejected() {
        assert_eq!(
            "loud".parse::<LogFilter>(),
            Err(LogSpecError::Level("loud".into()))
        );
        assert_eq!(
            "=debug".parse::<LogFilter>(),
            Err(LogSpecError::EmptyTarget("=debug".into()))
        );
        assert!("board_locate_core=sometimes".parse::<LogFilter>().is_err());
    }
}
