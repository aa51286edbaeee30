//! Terminal and markdown rendering of reports and snapshots

use colored::{ColoredString, Colorize};
use shelfard_core::{DriftReport, Schema, Severity};
use shelfard_registry::SnapshotInfo;

/// Render a drift report for the terminal
pub fn render_drift(report: &DriftReport) -> String {
    let mut out = String::new();

    if !report.has_changes() {
        out.push_str(&format!(
            "{}  (last snapshot: version {}, {})\n",
            format!("✓ No drift detected for '{}'", report.schema_name).green(),
            report.baseline.version,
            report.baseline.captured_at
        ));
        return out;
    }

    let header = format!("Schema drift detected for '{}'", report.schema_name);
    let header = match report.overall_severity {
        Some(Severity::Breaking) => format!("✗ {}", header).red().bold(),
        _ => format!("⚠ {}", header).yellow().bold(),
    };
    out.push_str(&format!("{}\n", header));
    out.push_str(&format!("  {}\n\n", report.summary_line()));

    for change in &report.changes {
        let label = severity_label(change.severity, &format!("[{:<8}]", change.severity.to_string()));
        out.push_str(&format!("  {} {:<25} '{}'\n", label, change.code.as_str(), change.path));
        out.push_str(&format!("             {}\n\n", change.summary));
    }

    out
}

fn severity_label(severity: Severity, text: &str) -> ColoredString {
    match severity {
        Severity::Breaking => text.red().bold(),
        Severity::Warning => text.yellow(),
        Severity::Safe => text.green(),
    }
}

/// Generate markdown report
pub fn generate_markdown_report(report: &DriftReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Schema Drift Report: {}\n\n", report.schema_name));
    md.push_str(&format!("**Report version:** {}\n\n", report.version));
    md.push_str(&format!("**Generated:** {}\n\n", report.generated_at));
    md.push_str(&format!(
        "**Baseline:** version {} ({})\n\n",
        report.baseline.version, report.baseline.captured_at
    ));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Total changes: {}\n", report.summary.total));
    md.push_str(&format!("- Breaking: {}\n", report.summary.breaking));
    md.push_str(&format!("- Warning: {}\n", report.summary.warning));
    md.push_str(&format!("- Safe: {}\n", report.summary.safe));
    md.push('\n');

    if !report.has_changes() {
        md.push_str("✅ **No drift detected!**\n");
        return md;
    }

    md.push_str("## Changes\n\n");
    md.push_str("| Severity | Code | Column | Summary |\n");
    md.push_str("|----------|------|--------|---------|\n");

    for change in &report.changes {
        let emoji = match change.severity {
            Severity::Breaking => "❌",
            Severity::Warning => "⚠️",
            Severity::Safe => "✅",
        };
        md.push_str(&format!(
            "| {} {} | `{}` | `{}` | {} |\n",
            emoji,
            change.severity,
            change.code.as_str(),
            change.path,
            change.summary.replace('|', "\\|")
        ));
    }

    md
}

/// Render one snapshot as an indented column listing
pub fn render_schema(schema: &Schema, fingerprint: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} (version {}, captured {})\n",
        schema.name.bold(),
        schema.version,
        schema.captured_at.to_rfc3339()
    ));
    out.push_str(&format!("fingerprint: {}\n", fingerprint));
    out.push_str(&format!("root: {}\n\n", schema.root.column_type));

    let columns: Vec<(String, &shelfard_core::Column)> = schema
        .columns()
        .into_iter()
        .skip(1)
        .map(|(path, column)| (path.to_string(), column))
        .collect();

    let width = columns.iter().map(|(path, _)| path.len()).max().unwrap_or(0);

    for (path, column) in columns {
        let mut line = format!("  {:<width$}  {}", path, column.column_type, width = width);
        if column.nullable {
            line.push_str(&format!("  {}", "nullable".dimmed()));
        }
        if let Some(default) = &column.default {
            line.push_str(&format!("  default {}", default));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Render the registry listing, one line per schema at its latest version
pub fn render_registry(entries: &[SnapshotInfo]) -> String {
    if entries.is_empty() {
        return format!("{}\n", "No snapshots registered".yellow());
    }

    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    let mut out = String::new();

    for entry in entries {
        out.push_str(&format!(
            "{:<width$}  v{:<4} {:>3} columns  {}\n",
            entry.name,
            entry.version,
            entry.top_level_columns,
            entry.captured_at.to_rfc3339(),
            width = width
        ));
    }

    out
}
