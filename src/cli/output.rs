// Output formatting and display for CLI

use crate::error::ErrorKind;
use crate::logs::RotatedFile;
use colored::*;
use std::path::Path;

/// Print a `logged:` line for a durably written record
pub fn print_logged(line: &str) {
    println!("logged:{}", line);
}

/// Print a failed write reported on the event stream
pub fn print_write_error(kind: ErrorKind, detail: &str) {
    eprintln!("{} {}", format!("✗ {}:", kind).red().bold(), detail);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a rotation notice
pub fn print_rotated(rotated: &RotatedFile) {
    eprintln!(
        "{} rotated to {}",
        "↻".cyan().bold(),
        rotated.path.display().to_string().cyan()
    );
}

/// Print where records go and when the live file rotates
pub fn print_target(live_path: &Path, threshold: u64, rotate_daily: bool) {
    let daily = if rotate_daily { ", daily" } else { "" };
    eprintln!(
        "{} {} {}",
        "ℹ".blue().bold(),
        live_path.display().to_string().cyan(),
        format!("(rotate at {}{})", format_size(threshold), daily).dimmed()
    );
}

/// Print the end-of-input summary
pub fn print_summary(written: usize, failed: usize, skipped: usize) {
    let status = if failed == 0 {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    eprintln!(
        "{} {} written, {} failed, {} skipped",
        status,
        written,
        failed,
        skipped
    );
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2}GB", bytes as f64 / GB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2048), "2.0KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00GB");
    }
}
