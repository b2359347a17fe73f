//! Kernel-style print macros
//!
//! Leveled, line-atomic output to stderr. Each line carries the level and
//! the name of the emitting OS thread.
//!
//! # Environment Variables
//!
//! - `RDV_LOG_LEVEL=<level>` - off, error, warn, info, debug, trace (or 0-5)
//! - `RDV_FLUSH_EPRINT=1` - Flush stderr after each line
//!
//! # Usage
//!
//! ```ignore
//! use rendezvous_core::{kdebug, kerror};
//!
//! kdebug!("round {} started, {} remaining", round, remaining);
//! kerror!("{}", violation);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log levels
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name or digit, `None` if unrecognised
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN ",
            LogLevel::Info => "INFO ",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

const UNINIT: u8 = u8::MAX;
const FLUSH_BIT: u8 = 0x80;

// Low bits: level. High bit: flush after each line. UNINIT until first use.
static CONFIG: AtomicU8 = AtomicU8::new(UNINIT);

fn config() -> u8 {
    let cur = CONFIG.load(Ordering::Relaxed);
    if cur != UNINIT {
        return cur;
    }
    let level = std::env::var("RDV_LOG_LEVEL")
        .ok()
        .and_then(|v| LogLevel::parse(&v))
        .unwrap_or(LogLevel::Info);
    let flush = crate::env::env_get_bool("RDV_FLUSH_EPRINT", false);
    let packed = level as u8 | if flush { FLUSH_BIT } else { 0 };
    // Lose the race gracefully: a programmatic setter may have run first
    match CONFIG.compare_exchange(UNINIT, packed, Ordering::Relaxed, Ordering::Relaxed) {
        Ok(_) => packed,
        Err(existing) => existing,
    }
}

/// Current log level
#[inline]
pub fn log_level() -> LogLevel {
    LogLevel::from_u8(config() & !FLUSH_BIT)
}

/// Check if a log level is enabled
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

/// Set log level programmatically, keeping the flush setting
pub fn set_log_level(level: LogLevel) {
    let flush = config() & FLUSH_BIT;
    CONFIG.store(level as u8 | flush, Ordering::Relaxed);
}

pub fn set_flush_enabled(enabled: bool) {
    let level = config() & !FLUSH_BIT;
    CONFIG.store(level | if enabled { FLUSH_BIT } else { 0 }, Ordering::Relaxed);
}

#[inline]
pub fn flush_enabled() -> bool {
    config() & FLUSH_BIT != 0
}

fn write_line(prefix: Option<LogLevel>, args: std::fmt::Arguments<'_>) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    if let Some(level) = prefix {
        let current = std::thread::current();
        let _ = write!(out, "[{}] [{}] ", level.tag(), current.name().unwrap_or("-"));
    }
    let _ = out.write_fmt(args);
    let _ = out.write_all(b"\n");
    if flush_enabled() {
        let _ = out.flush();
    }
}

#[doc(hidden)]
pub fn _kprintln_impl(args: std::fmt::Arguments<'_>) {
    write_line(None, args);
}

#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if level_enabled(level) {
        write_line(Some(level), args);
    }
}

// ============================================================================
// Public Macros
// ============================================================================

/// Print a line to stderr regardless of log level
#[macro_export]
macro_rules! kprintln {
    ($($arg:tt)*) => {{
        $crate::kprint::_kprintln_impl(format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Most verbose level; enter/exit/checkpoint traffic
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Trace, format_args!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("2"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::from_u8(42), LogLevel::Trace);
    }

    #[test]
    fn test_set_level_keeps_flush() {
        set_flush_enabled(true);
        set_log_level(LogLevel::Error);
        assert!(flush_enabled());
        assert_eq!(log_level(), LogLevel::Error);
        assert!(level_enabled(LogLevel::Error));
        assert!(!level_enabled(LogLevel::Warn));
        set_flush_enabled(false);
        assert_eq!(log_level(), LogLevel::Error);
    }

    #[test]
    fn test_macros_compile() {
        kprintln!("kprint test {}", 1);
        kerror!("error {}", "msg");
        kwarn!("warn");
        kinfo!("info");
        kdebug!("debug");
        ktrace!("trace");
    }
}
