//! Result rendering for the command line
//!
//! Commands hand their results to a [`Renderer`] chosen once from
//! `--output`. JSON and YAML are produced from the `Serialize` impl of the
//! result; tables come from its [`TableView`] impl. The formatting helpers
//! below are shared by every table view.

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use prettytable::{format, Table};
use serde::Serialize;

use crate::error::{Result, VstatsError};

/// Output format selected with `--output`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Human-readable rendering of a command result
pub trait TableView {
    /// Print the value to stdout
    fn print_table(&self);
}

/// Renders command results in the selected [`OutputFormat`]
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    /// Create a renderer for `format`
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Selected format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether results go to a table (and human hints may be printed)
    pub fn is_table(&self) -> bool {
        self.format == OutputFormat::Table
    }

    /// Print `value` in the selected format
    ///
    /// # Errors
    ///
    /// Returns a serialization error for JSON or YAML output
    pub fn render<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize + TableView + ?Sized,
    {
        match self.format {
            OutputFormat::Table => value.print_table(),
            OutputFormat::Json | OutputFormat::Yaml => {
                let text = self.serialize(value)?;
                print!("{}", text);
            }
        }
        Ok(())
    }

    /// Serialize `value` as JSON or YAML text, newline terminated
    ///
    /// # Errors
    ///
    /// Returns `VstatsError::Config` when the format is `Table`, which has
    /// no text serialization
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut text =
                    serde_json::to_string_pretty(value).map_err(VstatsError::Serialization)?;
                text.push('\n');
                Ok(text)
            }
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Table => {
                Err(VstatsError::Config("table output has no text serialization".into()).into())
            }
        }
    }
}

/// Turn color escapes on or off for the rest of the process
pub fn set_color_enabled(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        colored::control::set_override(false);
    }
}

/// Table with bold column headers
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(headers.iter().map(|h| h.bold().cyan()).collect());
    table
}

/// Print `label: value` pairs aligned in two columns
pub fn print_details(rows: &[(&str, String)]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    for (label, value) in rows {
        table.add_row(prettytable::row![format!("  {}:", label), value]);
    }
    table.printstd();
}

/// Boxed heading used after successful deployments and on limit errors
pub fn print_banner(title: &str) {
    let width = 51;
    println!("╔{}╗", "═".repeat(width));
    println!("║{:^width$}║", title, width = width);
    println!("╚{}╝", "═".repeat(width));
}

/// Human-readable byte count, 1024 based with one decimal
///
/// # Examples
///
/// ```
/// use vstats::output::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// assert_eq!(format_bytes(8 * 1024 * 1024 * 1024), "8.0 GB");
/// ```
pub fn format_bytes(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;
    const TB: i64 = GB * 1024;

    let value = bytes as f64;
    match bytes {
        b if b >= TB => format!("{:.1} TB", value / TB as f64),
        b if b >= GB => format!("{:.1} GB", value / GB as f64),
        b if b >= MB => format!("{:.1} MB", value / MB as f64),
        b if b >= KB => format!("{:.1} KB", value / KB as f64),
        b => format!("{} B", b),
    }
}

/// Percentage with one decimal
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Optional percentage, `-` when absent
pub fn opt_percent(value: Option<f64>) -> String {
    value.map(format_percent).unwrap_or_else(|| "-".to_string())
}

/// Optional byte count, `-` when absent
pub fn opt_bytes(value: Option<i64>) -> String {
    value.map(format_bytes).unwrap_or_else(|| "-".to_string())
}

/// Optional integer, `-` when absent
pub fn opt_int(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Optional float with two decimals, `-` when absent
pub fn opt_float(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Optional text, `-` when absent or empty
pub fn opt_str(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Local `YYYY-MM-DD HH:MM:SS`, `-` when absent
pub fn format_time(time: Option<&DateTime<Utc>>) -> String {
    match time {
        Some(t) => t
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

/// Local `MM-DD HH:MM` used for history rows
pub fn format_short_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%m-%d %H:%M").to_string()
}

/// Relative time such as `5m ago`, `-` when absent
pub fn format_time_ago(time: Option<&DateTime<Utc>>) -> String {
    format_time_ago_from(time, Utc::now())
}

/// [`format_time_ago`] against an explicit clock
pub fn format_time_ago_from(time: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(time) = time else {
        return "-".to_string();
    };
    let elapsed = now.signed_duration_since(*time);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

/// Status with icon and color
///
/// online/active/healthy are green `●`, offline/inactive/unhealthy red
/// `○`, pending/connecting yellow `◐`, anything else gray `?`.
pub fn format_status(status: &str) -> ColoredString {
    match status.to_lowercase().as_str() {
        "online" | "active" | "healthy" => format!("● {}", status).green(),
        "offline" | "inactive" | "unhealthy" => format!("○ {}", status).red(),
        "pending" | "connecting" => format!("◐ {}", status).yellow(),
        _ => format!("? {}", status).bright_black(),
    }
}

/// Plan limit, `unlimited` when negative
pub fn format_limit(limit: i64) -> String {
    if limit < 0 {
        "unlimited".to_string()
    } else {
        limit.to_string()
    }
}

/// Cloud connection flag of a web instance health check
pub fn format_connected(connected: bool) -> ColoredString {
    if connected {
        "✓ connected".green()
    } else {
        "✗ disconnected".red()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_bytes_boundaries() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024_i64.pow(4) / 2), "1.5 TB");
    }

    #[test]
    fn test_optional_helpers() {
        assert_eq!(opt_percent(Some(12.345)), "12.3%");
        assert_eq!(opt_percent(None), "-");
        assert_eq!(opt_bytes(None), "-");
        assert_eq!(opt_int(Some(4)), "4");
        assert_eq!(opt_float(Some(0.5)), "0.50");
        assert_eq!(opt_str(Some("")), "-");
        assert_eq!(opt_str(Some("linux")), "linux");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc::now();
        assert_eq!(format_time_ago_from(None, now), "-");
        assert_eq!(format_time_ago_from(Some(&now), now), "just now");
        assert_eq!(
            format_time_ago_from(Some(&(now - Duration::minutes(5))), now),
            "5m ago"
        );
        assert_eq!(
            format_time_ago_from(Some(&(now - Duration::hours(3))), now),
            "3h ago"
        );
        assert_eq!(
            format_time_ago_from(Some(&(now - Duration::days(2))), now),
            "2d ago"
        );
    }

    #[test]
    fn test_format_status_icons() {
        assert!(format_status("online").to_string().contains("● online"));
        assert!(format_status("Healthy").to_string().contains("● Healthy"));
        assert!(format_status("offline").to_string().contains("○ offline"));
        assert!(format_status("connecting").to_string().contains("◐ connecting"));
        assert!(format_status("weird").to_string().contains("? weird"));
    }

    #[test]
    fn test_format_limit() {
        assert_eq!(format_limit(-1), "unlimited");
        assert_eq!(format_limit(3), "3");
    }

    #[test]
    fn test_serialize_json_and_yaml() {
        #[derive(Serialize)]
        struct Row {
            name: &'static str,
        }
        let row = Row { name: "web-01" };

        let json = Renderer::new(OutputFormat::Json).serialize(&row).unwrap();
        assert_eq!(json, "{\n  \"name\": \"web-01\"\n}\n");

        let yaml = Renderer::new(OutputFormat::Yaml).serialize(&row).unwrap();
        assert_eq!(yaml, "name: web-01\n");

        assert!(Renderer::new(OutputFormat::Table).serialize(&row).is_err());
    }
}
