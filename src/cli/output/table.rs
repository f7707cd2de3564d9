//! Table output formatting for CLI commands
//!
//! Agent and diagnostic tables using comfy-table, with color-coded phases.

use std::env;

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::annotations::{DASHBOARD_ICON_ANNOTATION, SERVICE_ANNOTATION};
use crate::domain::models::{AgentResponse, Diagnostic, Severity};

use super::truncate;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Formatter that detects color support.
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Formatter with explicit settings.
    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format agent summaries as a table
    pub fn format_agents(&self, agents: &[AgentResponse]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Namespace").add_attribute(Attribute::Bold),
            Cell::new("Model").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Icon").add_attribute(Attribute::Bold),
            Cell::new("Service").add_attribute(Attribute::Bold),
        ]);

        for agent in agents {
            let phase = agent.status.as_deref().unwrap_or("-");
            let status_cell = if self.use_colors {
                Cell::new(phase).fg(phase_color(phase))
            } else {
                Cell::new(format!("{} {}", phase_icon(phase), phase))
            };
            let annotation = |key: &str| {
                agent
                    .annotations
                    .as_ref()
                    .and_then(|a| a.get(key))
                    .map_or("-", String::as_str)
                    .to_string()
            };

            table.add_row(vec![
                Cell::new(truncate(&agent.name, 30)),
                Cell::new(&agent.namespace),
                Cell::new(agent.model_ref.as_deref().unwrap_or("-")),
                status_cell,
                Cell::new(annotation(DASHBOARD_ICON_ANNOTATION)),
                Cell::new(annotation(SERVICE_ANNOTATION)),
            ]);
        }

        table.to_string()
    }

    /// Format diagnostics as a table
    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new("Component").add_attribute(Attribute::Bold),
            Cell::new("Field").add_attribute(Attribute::Bold),
            Cell::new("Code").add_attribute(Attribute::Bold),
            Cell::new("Message").add_attribute(Attribute::Bold),
        ]);

        for diagnostic in diagnostics {
            let severity = match diagnostic.severity {
                Severity::Fatal => "fatal",
                Severity::Warning if diagnostic.optional => "warning (optional)",
                Severity::Warning => "warning",
            };
            let severity_cell = if self.use_colors {
                let color = if diagnostic.is_fatal() {
                    Color::Red
                } else {
                    Color::Yellow
                };
                Cell::new(severity).fg(color)
            } else {
                Cell::new(severity)
            };

            table.add_row(vec![
                severity_cell,
                Cell::new(diagnostic.component.as_str()),
                Cell::new(&diagnostic.field_path),
                Cell::new(diagnostic.code),
                Cell::new(truncate(&diagnostic.message, 80)),
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn phase_color(phase: &str) -> Color {
    match phase {
        "Ready" => Color::Green,
        "Degraded" => Color::Yellow,
        "Error" => Color::Red,
        _ => Color::Grey,
    }
}

fn phase_icon(phase: &str) -> &'static str {
    match phase {
        "Ready" => "✓",
        "Degraded" => "!",
        "Error" => "✗",
        _ => "○",
    }
}
