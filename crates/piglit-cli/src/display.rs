//! Terminal output helpers

use console::style;
use piglit_compression::ResolvedMode;
use piglit_types::{Mode, DEFAULT_MODE};
use std::path::Path;

/// Print the active mode
pub fn display_mode(resolved: &ResolvedMode) {
    println!(
        "{} {} {}",
        style("Compression:").bold(),
        style(&resolved.mode).cyan().bold(),
        style(format!("(from {})", resolved.source)).dim()
    );
}

/// Print registered modes, highlighting the active one
pub fn display_modes<'a>(modes: impl Iterator<Item = &'a Mode>, active: Option<&Mode>) {
    println!("{}", style("Registered modes:").bold().underlined());
    for mode in modes {
        let marker = if Some(mode) == active { "*" } else { " " };
        let suffix = mode.suffix().unwrap_or_else(|| "(no suffix)".to_string());
        let default = if mode.as_str() == DEFAULT_MODE {
            style(" default").dim().to_string()
        } else {
            String::new()
        };
        println!(
            " {} {:<6} {}{}",
            style(marker).green().bold(),
            style(mode).cyan(),
            suffix,
            default
        );
    }
}

/// Report a written file
pub fn display_written(action: &str, path: &Path, bytes: u64) {
    println!(
        "{} {} {} ({})",
        style("✓").green().bold(),
        action,
        style(path.display()).cyan(),
        format_bytes(bytes)
    );
}

/// Report a failure on stderr
pub fn display_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", style("error:").red().bold(), err);
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
