//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use solax_core::{SensorDescriptor, SensorReading};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&line_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let result = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    result.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

// ── Sensor readings ──────────────────────────────────────────────────

/// A reading tagged with the site it came from.
#[derive(Debug, Serialize)]
pub struct SiteReading {
    pub site: String,
    #[serde(flatten)]
    pub reading: SensorReading,
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Sensor")]
    sensor: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: &'static str,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v}"))
}

pub fn render_readings(format: &OutputFormat, color: bool, readings: &[SiteReading]) -> String {
    render_list(
        format,
        readings,
        |r| {
            let status = if r.reading.stale { "stale" } else { "fresh" };
            ReadingRow {
                site: r.site.clone(),
                sensor: r.reading.name,
                value: format_value(r.reading.value),
                unit: r.reading.unit.unwrap_or(""),
                status: match (color, r.reading.stale) {
                    (false, _) => status.into(),
                    (true, true) => status.yellow().to_string(),
                    (true, false) => status.green().to_string(),
                },
                updated: r
                    .reading
                    .updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            }
        },
        |r| format!("{}.{}={}", r.site, r.reading.name, format_value(r.reading.value)),
    )
}

// ── Sensor descriptors ───────────────────────────────────────────────

#[derive(Tabled)]
struct DescriptorRow {
    #[tabled(rename = "Sensor")]
    name: &'static str,
    #[tabled(rename = "Unit")]
    unit: &'static str,
}

pub fn render_descriptors(format: &OutputFormat, descriptors: &[SensorDescriptor]) -> String {
    render_list(
        format,
        descriptors,
        |d| DescriptorRow {
            name: d.name(),
            unit: d.unit.unwrap_or(""),
        },
        |d| d.name().to_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use solax_core::model::BATTERY_SENSORS;

    fn reading(value: Option<f64>, stale: bool) -> SiteReading {
        SiteReading {
            site: "home".into(),
            reading: SensorReading {
                name: "Voltage",
                unit: Some("V"),
                value,
                stale,
                updated_at: None,
            },
        }
    }

    #[test]
    fn plain_readings_are_dotted_pairs() {
        let out = render_readings(
            &OutputFormat::Plain,
            false,
            &[reading(Some(52.3), false), reading(None, true)],
        );
        assert_eq!(out, "home.Voltage=52.3\nhome.Voltage=-");
    }

    #[test]
    fn json_readings_flatten_site() {
        let out = render_readings(&OutputFormat::JsonCompact, false, &[reading(Some(1.5), true)]);
        assert!(out.contains(r#""site":"home""#));
        assert!(out.contains(r#""name":"Voltage""#));
        assert!(out.contains(r#""stale":true"#));
    }

    #[test]
    fn table_lists_descriptors() {
        let out = render_descriptors(&OutputFormat::Table, &BATTERY_SENSORS);
        assert!(out.contains("Remaining Capacity"));
        assert!(out.contains("°C"));
    }
}
