//! Human-facing status output on stderr.

use std::time::Duration;

use console::style;
use weft_core::Severity;

use crate::output::Metadata;

/// Whether stderr should be colored.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow the terminal.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::colors_enabled_stderr()
}

/// Apply the color choice to everything `console` styles.
pub fn init_colors(enabled: bool) {
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}

/// Format duration in human-readable format.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// One-line summary of what was found, e.g.
/// `3 elements, 1 mixin, 0 behaviors, 0 namespaces in 12ms (2 warnings)`.
pub fn summary_line(metadata: &Metadata<'_>, elapsed: Duration) -> String {
    let mut line = format!(
        "{}, {}, {}, {} in {}",
        plural(metadata.elements.len(), "element"),
        plural(metadata.mixins.len(), "mixin"),
        plural(metadata.behaviors.len(), "behavior"),
        plural(metadata.namespaces.len(), "namespace"),
        format_duration(elapsed),
    );
    if !metadata.warnings.is_empty() {
        line.push_str(&format!(" ({})", plural(metadata.warnings.len(), "warning")));
    }
    line
}

/// Print the summary and any error-severity warnings to stderr.
pub fn print_summary(metadata: &Metadata<'_>, elapsed: Duration) {
    for warning in metadata
        .warnings
        .iter()
        .filter(|warning| warning.severity == Severity::Error)
    {
        eprintln!("{} {}", style("✗").red().bold(), warning);
    }
    eprintln!(
        "{} {}",
        style("✓").green().bold(),
        summary_line(metadata, elapsed)
    );
}
