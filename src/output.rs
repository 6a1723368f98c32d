//! # Console Output
//!
//! Batch commands end with a one-line summary. Whether that line (and any
//! other human-facing line) carries emoji or plain markers depends on the
//! terminal and the user's preferences:
//!
//! - `--color=never|always|auto` on the command line
//! - `NO_COLOR` disables decoration when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables it, `CLICOLOR_FORCE=1` forces it for non-TTY output
//! - `TERM=dumb` disables it
//!
//! Machine-readable output (JSON reports, CSV lines) is never decorated.

use std::env;

use crate::batch::BatchReport;

/// Whether human-facing output may use colors and emoji.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Decide from the `--color` flag value and the environment.
    ///
    /// `always` wins over `NO_COLOR`; anything other than `always` and
    /// `never` means auto-detection.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone counts, even when empty.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stderr().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// `emoji_str` when decoration is allowed, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Final line of a batch command, e.g. `[OK] put-file: 3 entries: ...`.
pub fn summary_line(config: &OutputConfig, command: &str, report: &BatchReport) -> String {
    let marker = if report.has_failures() {
        emoji(config, "❌", "[FAILED]")
    } else {
        emoji(config, "✅", "[OK]")
    };
    let line = format!("{} {}: {}", marker, command, report);
    if config.use_color && report.has_failures() {
        console::style(line).red().to_string()
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::EntryOutcome;
    use serial_test::serial;

    #[test]
    fn test_color_flags() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
        assert!(!OutputConfig::from_env_and_flag("never").use_color);
    }

    #[test]
    #[serial]
    fn test_no_color_env_disables_auto() {
        std::env::set_var("NO_COLOR", "");
        let config = OutputConfig::from_env_and_flag("auto");
        std::env::remove_var("NO_COLOR");
        assert!(!config.use_color);
    }

    #[test]
    fn test_plain_summary_line() {
        let mut report = BatchReport::default();
        report.record(EntryOutcome::Done);
        report.record(EntryOutcome::Failed);

        let line = summary_line(&OutputConfig::without_color(), "deadline-commit", &report);
        assert_eq!(
            line,
            "[FAILED] deadline-commit: 2 entries: 1 done, 0 unchanged, 1 failed"
        );
    }

    #[test]
    fn test_emoji_summary_line() {
        let report = BatchReport::default();
        let line = summary_line(&OutputConfig::with_color(), "fork", &report);
        assert!(line.starts_with("✅ fork"));
    }
}
