//! Output formatters for CLI commands.
//!
//! Every command builds a serializable report and hands it to
//! [`format_output`], so the three output modes stay consistent.

use anyhow::Result;
use colored::Colorize;
use multimatch_core::cli::OutputFormat;
use serde::Serialize;

/// Format a report according to the specified output format.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Examples
///
/// ```
/// use multimatch_cli::formatters::format_output;
/// use multimatch_core::cli::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Hit {
///     index: usize,
///     pattern: String,
/// }
///
/// let hit = Hit { index: 1, pattern: "warn".to_string() };
///
/// let output = format_output(&hit, OutputFormat::Text)?;
/// assert_eq!(output, "index=1\npattern=warn");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Format data as JSON with 2-space indentation.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

/// Plain `key=value` lines, one per leaf, for grep and shell scripts.
pub mod text {
    use super::{Result, Serialize};
    use serde_json::Value;

    /// Flatten data into `path=value` lines.
    ///
    /// Nested keys are joined with `.` and array elements are written as
    /// `key[i]`. Strings are written raw, `null` as an empty value.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut lines = Vec::new();
        flatten(&value, String::new(), &mut lines);
        Ok(lines.join("\n"))
    }

    fn flatten(value: &Value, path: String, lines: &mut Vec<String>) {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, child) in map {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    flatten(child, child_path, lines);
                }
            }
            Value::Array(items) if !items.is_empty() => {
                for (i, child) in items.iter().enumerate() {
                    flatten(child, format!("{path}[{i}]"), lines);
                }
            }
            Value::Object(_) => lines.push(format!("{path}={{}}")),
            Value::Array(_) => lines.push(format!("{path}=[]")),
            Value::Null => lines.push(format!("{path}=")),
            Value::String(s) => lines.push(format!("{path}={s}")),
            Value::Bool(b) => lines.push(format!("{path}={b}")),
            Value::Number(n) => lines.push(format!("{path}={n}")),
        }
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, Result, Serialize};
    use serde_json::Value;

    /// Format data as colorized, indented output.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut out = String::new();
        write_value(&value, 0, &mut out);
        Ok(out)
    }

    fn write_value(value: &Value, indent: usize, out: &mut String) {
        match value {
            Value::Null => out.push_str(&"-".dimmed().to_string()),
            Value::Bool(true) => out.push_str(&"yes".green().to_string()),
            Value::Bool(false) => out.push_str(&"no".yellow().to_string()),
            Value::Number(n) => out.push_str(&n.to_string().cyan().to_string()),
            Value::String(s) => out.push_str(s),
            Value::Array(items) if items.is_empty() => out.push_str(&"none".dimmed().to_string()),
            Value::Object(map) if map.is_empty() => out.push_str(&"-".dimmed().to_string()),
            Value::Array(items) => {
                for item in items {
                    out.push('\n');
                    out.push_str(&"  ".repeat(indent));
                    out.push_str("- ");
                    match item {
                        Value::Object(map) if !map.is_empty() => {
                            write_object(map, indent + 1, true, out);
                        }
                        other => write_value(other, indent + 1, out),
                    }
                }
            }
            Value::Object(map) => write_object(map, indent, indent == 0, out),
        }
    }

    /// Writes `key: value` lines; the first key stays on the current line
    /// when `first_inline` is set.
    fn write_object(
        map: &serde_json::Map<String, Value>,
        indent: usize,
        first_inline: bool,
        out: &mut String,
    ) {
        for (i, (key, child)) in map.iter().enumerate() {
            if i > 0 || !first_inline {
                out.push('\n');
                out.push_str(&"  ".repeat(indent));
            }
            out.push_str(&key.replace('_', " ").bold().to_string());
            out.push(':');
            if !is_nested(child) {
                out.push(' ');
            }
            write_value(child, indent + 1, out);
        }
    }

    fn is_nested(value: &Value) -> bool {
        match value {
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Hit {
        index: usize,
        pattern: String,
    }

    #[derive(Serialize)]
    struct Report {
        backend: String,
        matched: bool,
        first: Option<Hit>,
        all: Vec<Hit>,
        missing: Option<usize>,
    }

    fn report() -> Report {
        Report {
            backend: "sequential".to_string(),
            matched: true,
            first: Some(Hit {
                index: 0,
                pattern: "error".to_string(),
            }),
            all: vec![
                Hit {
                    index: 0,
                    pattern: "error".to_string(),
                },
                Hit {
                    index: 2,
                    pattern: "fail".to_string(),
                },
            ],
            missing: None,
        }
    }

    #[test]
    fn test_json_format() {
        let output = json::format(&report()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["first"]["pattern"], "error");
        assert_eq!(parsed["all"][1]["index"], 2);
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_text_format_flattens_paths() {
        let output = text::format(&report()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert!(lines.contains(&"backend=sequential"));
        assert!(lines.contains(&"matched=true"));
        assert!(lines.contains(&"first.index=0"));
        assert!(lines.contains(&"all[1].pattern=fail"));
        assert!(lines.contains(&"missing="));
    }

    #[test]
    fn test_text_format_empty_collections() {
        #[derive(Serialize)]
        struct Empty {
            items: Vec<u8>,
        }
        assert_eq!(text::format(&Empty { items: vec![] }).unwrap(), "items=[]");
    }

    #[test]
    fn test_pretty_format() {
        colored::control::set_override(false);
        let output = pretty::format(&report()).unwrap();
        assert!(output.starts_with("backend: sequential"));
        assert!(output.contains("matched: yes"));
        assert!(output.contains("missing: -"));
        assert!(output.contains("all:\n  - index: 0\n    pattern: error"));
        assert!(output.contains("pattern: fail"));
    }

    #[test]
    fn test_format_output_dispatch() {
        let data = report();
        assert!(
            format_output(&data, OutputFormat::Json)
                .unwrap()
                .contains("\"backend\"")
        );
        assert!(
            format_output(&data, OutputFormat::Text)
                .unwrap()
                .contains("backend=sequential")
        );
        assert!(
            format_output(&data, OutputFormat::Pretty)
                .unwrap()
                .contains("sequential")
        );
    }
}
