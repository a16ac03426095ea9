// Output formatting for CLI

use std::io::Write;

use anyhow::Result;
use serde_json::Value;

use super::config::OutputFormat;

/// Format and output data
pub struct OutputFormatter {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Pretty | OutputFormat::Json)
    }

    /// Output a metadata report
    pub fn output_metadata(&self, report: &Value, writer: &mut impl Write) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => writeln!(writer, "{}", serde_json::to_string_pretty(report)?)?,
            OutputFormat::Json => writeln!(writer, "{}", serde_json::to_string(report)?)?,
            OutputFormat::KeyValue => {
                for (key, value) in flatten(report) {
                    writeln!(writer, "{}: {}", key, value)?;
                }
            }
            OutputFormat::Table => self.output_table(report, writer)?,
        }
        Ok(())
    }

    /// Output as table
    fn output_table(&self, report: &Value, writer: &mut impl Write) -> Result<()> {
        let rows = flatten(report);
        let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        for (key, value) in &rows {
            writeln!(
                writer,
                "{:<width$}: {}",
                format!("{}:", key),
                value,
                width = max_key_len + 2
            )?;
        }
        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        Ok(())
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            println!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
}

/// Flatten nested objects and arrays into dotted keys.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    flatten_into(value, String::new(), &mut rows);
    rows
}

fn child_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn flatten_into(value: &Value, prefix: String, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(obj) => {
            for (key, inner) in obj {
                flatten_into(inner, child_key(&prefix, key), rows);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (index, inner) in arr.iter().enumerate() {
                flatten_into(inner, child_key(&prefix, &index.to_string()), rows);
            }
        }
        other => rows.push((prefix, format_value(other))),
    }
}

/// Format a scalar JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "(null)".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_values() {
        let value = json!({
            "file": "a.flac",
            "metadata": {
                "vorbis_comment": { "comments": [["TITLE", "Test"]] },
                "pictures": [],
                "stream_info": null
            }
        });
        let rows = flatten(&value);
        assert!(rows.contains(&("file".to_string(), "a.flac".to_string())));
        assert!(rows.contains(&(
            "metadata.vorbis_comment.comments.0.1".to_string(),
            "Test".to_string()
        )));
        assert!(rows.contains(&("metadata.pictures".to_string(), "[]".to_string())));
        assert!(rows.contains(&("metadata.stream_info".to_string(), "(null)".to_string())));
    }

    #[test]
    fn key_value_output() {
        let formatter = OutputFormatter::new(OutputFormat::KeyValue, false);
        let mut out = Vec::new();
        formatter
            .output_metadata(&json!({"audio_offset": 8272}), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "audio_offset: 8272\n");
    }
}
