//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::DeploymentSpec;
use crate::reconciler::{DeleteOutcome, UpsertAction, UpsertOutcome};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Setting row for table display.
#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of an upsert, together with the settings applied.
    #[must_use]
    pub fn format_upsert(&self, outcome: &UpsertOutcome, spec: &DeploymentSpec) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&UpsertJson {
                outcome,
                settings: SettingsJson::from(spec),
            })
            .unwrap_or_default(),
            OutputFormat::Text => Self::format_upsert_text(outcome, spec),
        }
    }

    fn format_upsert_text(outcome: &UpsertOutcome, spec: &DeploymentSpec) -> String {
        let action = match outcome.action {
            UpsertAction::Created => "created".green(),
            UpsertAction::Updated => "updated".yellow(),
        };

        let mut output = format!(
            "{} Function {} {action}\n",
            "✓".green(),
            outcome.function_name.bold()
        );

        if let Some(arn) = &outcome.function_arn {
            let _ = writeln!(output, "   ARN: {arn}");
        }
        if let Some(role) = &outcome.role_arn {
            let suffix = if outcome.role_created { " (new)" } else { "" };
            let _ = writeln!(output, "   Role: {role}{suffix}");
        }
        for policy in &outcome.attached_policies {
            let _ = writeln!(output, "   Policy: {}", policy.name);
        }
        if let Some(attempts) = outcome.configuration_attempts {
            if attempts > 1 {
                let _ = writeln!(output, "   Configuration applied after {attempts} attempts");
            }
        }

        output.push('\n');
        output.push_str(&Table::new(Self::setting_rows(outcome, spec)).to_string());
        output.push('\n');
        output
    }

    fn setting_rows(outcome: &UpsertOutcome, spec: &DeploymentSpec) -> Vec<SettingRow> {
        let mut rows = vec![
            SettingRow {
                setting: "Code",
                value: outcome.code.clone(),
            },
            SettingRow {
                setting: "Memory (MB)",
                value: spec.memory_mb.to_string(),
            },
            SettingRow {
                setting: "Timeout (s)",
                value: spec.timeout_secs.to_string(),
            },
        ];

        if !spec.runtime().is_empty() {
            rows.push(SettingRow {
                setting: "Runtime",
                value: spec.runtime().to_string(),
            });
        }
        if !spec.handler().is_empty() {
            rows.push(SettingRow {
                setting: "Handler",
                value: spec.handler().to_string(),
            });
        }
        if spec.environment.is_some() {
            rows.push(SettingRow {
                setting: "Environment",
                value: Self::truncate(&spec.environment_keys().join(", "), 48),
            });
        }
        if let Some(action) = spec.action.as_deref() {
            rows.push(SettingRow {
                setting: "Action",
                value: action.to_string(),
            });
        }

        rows
    }

    /// Formats the result of a deletion.
    #[must_use]
    pub fn format_delete(&self, outcome: &DeleteOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!(
                    "{} Function {} deleted\n",
                    "✓".green(),
                    outcome.function_name.bold()
                );

                match (&outcome.role_arn, outcome.role_deleted) {
                    (Some(role), true) => {
                        let _ = writeln!(output, "   Role {role} {}", "deleted".red());
                    }
                    (Some(role), false) => {
                        let _ = writeln!(output, "   Role {role} kept");
                    }
                    (None, _) => {}
                }
                for policy in &outcome.deleted_policies {
                    let _ = writeln!(output, "   Policy {} {}", policy.name, "deleted".red());
                }

                output
            }
        }
    }

    /// Formats an error message.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{head}...")
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct UpsertJson<'a> {
    #[serde(flatten)]
    outcome: &'a UpsertOutcome,
    settings: SettingsJson<'a>,
}

/// Applied settings. Environment values and the policy text are left out.
#[derive(serde::Serialize)]
struct SettingsJson<'a> {
    memory_mb: u32,
    timeout_secs: u32,
    runtime: &'a str,
    handler: &'a str,
    environment_keys: Vec<&'a str>,
    custom_policy: bool,
    autogenerate_execution_policy: bool,
    role_name: &'a str,
    region: Option<&'a str>,
    action: Option<&'a str>,
}

impl<'a> From<&'a DeploymentSpec> for SettingsJson<'a> {
    fn from(spec: &'a DeploymentSpec) -> Self {
        Self {
            memory_mb: spec.memory_mb,
            timeout_secs: spec.timeout_secs,
            runtime: spec.runtime(),
            handler: spec.handler(),
            environment_keys: spec.environment_keys(),
            custom_policy: spec.custom_policy().is_some(),
            autogenerate_execution_policy: spec.autogenerate_execution_policy,
            role_name: spec.role_name(),
            region: spec.region(),
            action: spec.action.as_deref(),
        }
    }
}
