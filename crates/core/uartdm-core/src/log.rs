//! Leveled logging facade for the driver stack.
//!
//! Drivers log through [`klog!`] and its per-level shorthands (`kinfo!`,
//! `kdebug!`, ...). The platform decides where the text goes by registering a
//! sink with [`set_log_fn`]; raw output from [`kprint!`] / [`kprintln!`] goes
//! to the function registered with [`set_print_fn`]. Until something is
//! registered, output is dropped.
//!
//! A boot console typically registers itself as the print function first and
//! is replaced once the full logger comes up. Both functions may be swapped at
//! any time.

use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Log severity. Lower values are more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Unrecoverable; the caller is about to halt.
    Fatal = 0,
    /// Something failed but execution continues.
    Error = 1,
    /// Unexpected condition.
    Warn = 2,
    /// Progress messages.
    Info = 3,
    /// Diagnostic detail.
    Debug = 4,
    /// Register-level tracing.
    Trace = 5,
}

impl LogLevel {
    /// Fixed-width name for aligned output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warn => "WARN ",
            Self::Info => "INFO ",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Fatal,
            1 => Self::Error,
            2 => Self::Warn,
            3 => Self::Info,
            4 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

// ---------------------------------------------------------------------------
// Level filter
// ---------------------------------------------------------------------------

static MAX_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Sets the most verbose level that is still forwarded to the log sink.
pub fn set_max_level(level: LogLevel) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Returns the current maximum level.
#[must_use]
pub fn max_level() -> LogLevel {
    LogLevel::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

/// Returns `true` if a message at `level` would reach the sink.
#[inline]
#[must_use]
pub fn enabled(level: LogLevel) -> bool {
    level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// Raw print (kprint! / kprintln!)
// ---------------------------------------------------------------------------

/// Signature of the raw print function.
pub type PrintFn = fn(fmt::Arguments<'_>);

fn discard_print(_args: fmt::Arguments<'_>) {}

static PRINT_FN: AtomicPtr<()> = AtomicPtr::new(discard_print as *mut ());

/// Registers the raw print function.
///
/// # Safety
///
/// `f` must be callable from every context that prints, including interrupt
/// handlers and the panic path.
pub unsafe fn set_print_fn(f: PrintFn) {
    PRINT_FN.store(f as *mut (), Ordering::Release);
}

#[inline]
fn load_print_fn() -> PrintFn {
    let ptr = PRINT_FN.load(Ordering::Acquire);
    // SAFETY: PRINT_FN only ever holds `discard_print` or a `PrintFn` passed
    // to `set_print_fn`.
    unsafe { core::mem::transmute::<*mut (), PrintFn>(ptr) }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    load_print_fn()(args);
}

/// Prints without level or filtering.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => { $crate::log::_print(format_args!($($arg)*)) };
}

/// Prints without level or filtering, followed by a newline.
#[macro_export]
macro_rules! kprintln {
    () => { $crate::kprint!("\n") };
    ($($arg:tt)*) => { $crate::kprint!("{}\n", format_args!($($arg)*)) };
}

// ---------------------------------------------------------------------------
// Leveled log (klog! and friends)
// ---------------------------------------------------------------------------

/// Signature of the leveled log sink.
pub type LogFn = fn(LogLevel, fmt::Arguments<'_>);

fn discard_log(_level: LogLevel, _args: fmt::Arguments<'_>) {}

static LOG_FN: AtomicPtr<()> = AtomicPtr::new(discard_log as *mut ());

/// Registers the leveled log sink.
///
/// # Safety
///
/// Same contract as [`set_print_fn`].
pub unsafe fn set_log_fn(f: LogFn) {
    LOG_FN.store(f as *mut (), Ordering::Release);
}

#[inline]
fn load_log_fn() -> LogFn {
    let ptr = LOG_FN.load(Ordering::Acquire);
    // SAFETY: LOG_FN only ever holds `discard_log` or a `LogFn` passed to
    // `set_log_fn`.
    unsafe { core::mem::transmute::<*mut (), LogFn>(ptr) }
}

#[doc(hidden)]
pub fn _log(level: LogLevel, args: fmt::Arguments<'_>) {
    if enabled(level) {
        load_log_fn()(level, args);
    }
}

/// Logs a message at the given level.
#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::_log($level, format_args!($($arg)*))
    };
}

/// Logs at [`LogLevel::Fatal`](crate::log::LogLevel::Fatal).
#[macro_export]
macro_rules! kfatal {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Fatal, $($arg)*) };
}

/// Logs at [`LogLevel::Error`](crate::log::LogLevel::Error).
#[macro_export]
macro_rules! kerr {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Error, $($arg)*) };
}

/// Logs at [`LogLevel::Warn`](crate::log::LogLevel::Warn).
#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Warn, $($arg)*) };
}

/// Logs at [`LogLevel::Info`](crate::log::LogLevel::Info).
#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Info, $($arg)*) };
}

/// Logs at [`LogLevel::Debug`](crate::log::LogLevel::Debug).
#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Debug, $($arg)*) };
}

/// Logs at [`LogLevel::Trace`](crate::log::LogLevel::Trace).
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => { $crate::klog!($crate::log::LogLevel::Trace, $($arg)*) };
}
