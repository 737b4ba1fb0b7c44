//! Output formatting

use mcesql_core::{Diagnostic, Severity};

use crate::args::OutputFormat;

/// Output formatter for diagnostics
pub struct OutputFormatter {
    format: OutputFormat,
    file_name: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print diagnostics in the configured format
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic], source: &str) {
        match self.format {
            OutputFormat::Human => self.print_human(diagnostics, source),
            OutputFormat::Json => println!("{}", self.json(diagnostics, source)),
            OutputFormat::Sarif => println!("{}", self.sarif(diagnostics, source)),
        }
    }

    fn print_human(&self, diagnostics: &[Diagnostic], source: &str) {
        for diag in diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "\x1b[31merror\x1b[0m",
                Severity::Warning => "\x1b[33mwarning\x1b[0m",
                Severity::Prereq => "\x1b[36mprereq\x1b[0m",
            };

            eprintln!("{}[{}]: {}", severity_str, diag.rule_id, diag.message);

            let (line, col) = offset_to_line_col(source, diag.span.start);
            eprintln!("  --> {}:{}:{}", self.file_name, line, col);

            if let Some(source_line) = get_source_line(source, line) {
                eprintln!("   |");
                eprintln!("{:>3} | {}", line, source_line);

                let padding = " ".repeat(col.saturating_sub(1));
                let width = source
                    .get(diag.span.start..diag.span.end)
                    .map_or(0, |text| text.lines().next().unwrap_or("").chars().count());
                eprintln!("   | {}{}", padding, "^".repeat(width.max(1)));
            }

            if let Some(help) = &diag.help {
                eprintln!("   = help: {}", help);
            }

            eprintln!();
        }
    }

    fn json(&self, diagnostics: &[Diagnostic], source: &str) -> String {
        let entries: Vec<serde_json::Value> = diagnostics
            .iter()
            .map(|d| {
                let (line, column) = offset_to_line_col(source, d.span.start);
                let mut value = serde_json::json!(d);
                value["line"] = line.into();
                value["column"] = column.into();
                value
            })
            .collect();
        let output = serde_json::json!({
            "file": self.file_name,
            "diagnostics": entries,
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn sarif(&self, diagnostics: &[Diagnostic], source: &str) -> String {
        let results: Vec<serde_json::Value> = diagnostics
            .iter()
            .map(|d| {
                let (start_line, start_column) = offset_to_line_col(source, d.span.start);
                let (end_line, end_column) = offset_to_line_col(source, d.span.end);
                serde_json::json!({
                    "ruleId": d.rule_id,
                    "level": match d.severity {
                        Severity::Error | Severity::Prereq => "error",
                        Severity::Warning => "warning",
                    },
                    "message": {
                        "text": d.message
                    },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": {
                                "uri": self.file_name
                            },
                            "region": {
                                "startLine": start_line,
                                "startColumn": start_column,
                                "endLine": end_line,
                                "endColumn": end_column
                            }
                        }
                    }]
                })
            })
            .collect();

        let sarif = serde_json::json!({
            "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            "version": "2.1.0",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": "mcesql",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                },
                "results": results
            }]
        });

        serde_json::to_string_pretty(&sarif).unwrap_or_default()
    }
}

/// Convert byte offset to line and column (1-indexed)
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Get a specific line from source (1-indexed)
fn get_source_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcesql_core::Span;

    #[test]
    fn test_offset_to_line_col() {
        let source = "SELECT a\nFROM [Dätä]\nLIMIT 1";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 9), (2, 1));
        let limit = source.find("LIMIT").unwrap();
        assert_eq!(offset_to_line_col(source, limit), (3, 1));
    }

    #[test]
    fn test_json_has_positions() {
        let source = "SELECT *\nFROM A LIMIT 1";
        let start = source.find("LIMIT").unwrap();
        let diag = Diagnostic::error("limit", "LIMIT is not supported in MCE SQL")
            .with_span(Span::new(start, start + 5));
        let formatter = OutputFormatter::new(OutputFormat::Json, "q.sql".to_string());
        let value: serde_json::Value =
            serde_json::from_str(&formatter.json(&[diag], source)).unwrap();
        let entry = &value["diagnostics"][0];
        assert_eq!(entry["ruleId"], "limit");
        assert_eq!(entry["startOffset"], start);
        assert_eq!(entry["line"], 2);
        assert_eq!(entry["column"], 8);
    }

    #[test]
    fn test_sarif_prereq_is_error_level() {
        let diag = Diagnostic::prereq("select-prerequisites", "Query is empty: start with SELECT");
        let formatter = OutputFormatter::new(OutputFormat::Sarif, "q.sql".to_string());
        let value: serde_json::Value = serde_json::from_str(&formatter.sarif(&[diag], "")).unwrap();
        assert_eq!(value["runs"][0]["results"][0]["level"], "error");
        assert_eq!(value["runs"][0]["tool"]["driver"]["name"], "mcesql");
    }
}
