//! Formatting of `crysym` output.

use std::fmt;

use log;

const CRYSYM_BANNER_LENGTH: usize = 91;

/// Logs an error to the `crysym-output` logger as well as to the default logger.
macro_rules! crysym_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "crysym-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `crysym-output` logger.
macro_rules! crysym_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "crysym-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `crysym-output` logger.
macro_rules! crysym_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "crysym-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {crysym_error, crysym_output, crysym_warn};

/// Logs a nicely formatted section title to the `crysym-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(CRYSYM_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    crysym_output!("┌──{bar}──┐");
    crysym_output!("│§ {title:^length$} §│");
    crysym_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `crysym-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    crysym_output!("{}", subtitle);
    crysym_output!("{}", bar);
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging `crysym` outputs nicely.
pub(crate) trait CrySymOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            crysym_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> CrySymOutput for T where T: fmt::Debug + fmt::Display {}
