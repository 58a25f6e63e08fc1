//! Console logger for the shell.

use core::fmt;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Print msg with color in Linux console
fn eprint_in_color(args: fmt::Arguments, color_code: u8) {
    eprint!("\u{1B}[{}m{}\u{1B}[0m", color_code, args);
}

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 34,  // Blue
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        eprint_in_color(
            format_args!(
                "[{:>5}][{}:{}] {}\n",
                record.level(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.args()
            ),
            color,
        );
    }

    fn flush(&self) {}
}

fn level_from_env(value: Option<&str>) -> LevelFilter {
    match value {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        Some("OFF") => LevelFilter::Off,
        _ => LevelFilter::Warn,
    }
}

/// Installs the logger, level taken from the `LOG` environment variable.
/// Calling it a second time leaves the first logger in place.
pub fn init() {
    static LOGGER: SimpleLogger = SimpleLogger;
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level_from_env(std::env::var("LOG").ok().as_deref()));
    }
}
