// src/core/exporter.rs

//! Report export.
//!
//! Every report is serialised to a `serde_json::Value` first, so the same
//! writers handle subdomain lists, port maps, analyzer reports and the full
//! pipeline report.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::info;

use crate::core::error::ExportError;

/// Items shown per HTML list before the rest are summarised.
const HTML_LIST_LIMIT: usize = 50;
/// Rows shown per HTML table before the rest are summarised.
const HTML_TABLE_LIMIT: usize = 20;
/// Nested values in HTML table cells are cut to this many characters.
const HTML_CELL_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Json,
    Csv,
    Txt,
    Html,
}

impl ExportFormat {
    /// Resolves a user-facing format name. `auto` picks the output file's
    /// extension, or JSON when it has none.
    pub fn resolve(format: &str, path: &Path) -> Result<Self, ExportError> {
        let name = if format.eq_ignore_ascii_case("auto") {
            path.extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("json")
                .to_string()
        } else {
            format.to_string()
        };
        ExportFormat::from_str(&name).map_err(|_| ExportError::UnsupportedFormat(name))
    }
}

/// Serialises `data` and writes it to `path` in the requested format.
pub fn save_report<T: Serialize>(data: &T, path: &Path, format: &str) -> Result<ExportFormat, ExportError> {
    let value = serde_json::to_value(data)?;
    save(&value, path, format)
}

/// Writes `data` to `path`, creating parent directories as needed.
pub fn save(data: &Value, path: &Path, format: &str) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::resolve(format, path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io { path: parent.to_path_buf(), source })?;
    }

    match format {
        ExportFormat::Json => write_file(path, &serde_json::to_string_pretty(data)?)?,
        ExportFormat::Csv => write_csv(data, path)?,
        ExportFormat::Txt => write_file(path, &render_txt(data))?,
        ExportFormat::Html => write_file(path, &render_html(data))?,
    }

    info!(path = %path.display(), format = %format, "Report saved.");
    Ok(format)
}

/// Reads the content of an export input: `.json` files are parsed, anything
/// else is carried as one plain-text string.
pub fn parse_input(content: &str, path: &Path) -> Result<Value, ExportError> {
    let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(content)?)
    } else {
        Ok(Value::String(content.to_string()))
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    fs::write(path, content).map_err(|source| ExportError::Io { path: path.to_path_buf(), source })
}

/// Plain rendering of a value inside a cell or a line: strings unquoted,
/// null empty, everything else as compact JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// --- CSV ---

/// Flattens `data` into rows of `column -> value`.
///
/// An array of objects becomes one row per object. An object becomes rows
/// tagged with a `key` column: nested objects are merged into their row and
/// arrays expand into one row per element. Returns `None` for an array of
/// scalars or a bare scalar, which are written one per line instead.
fn csv_rows(data: &Value) -> Option<Vec<Map<String, Value>>> {
    match data {
        Value::Array(items) if items.first().is_some_and(Value::is_object) => Some(
            items
                .iter()
                .map(|item| item.as_object().cloned().unwrap_or_default())
                .collect(),
        ),
        Value::Object(map) => {
            let mut rows = Vec::new();
            for (key, value) in map {
                match value {
                    Value::Object(inner) => {
                        let mut row = Map::new();
                        row.insert("key".into(), Value::String(key.clone()));
                        row.extend(inner.clone());
                        rows.push(row);
                    }
                    Value::Array(items) => {
                        for item in items {
                            let mut row = match item {
                                Value::Object(inner) => inner.clone(),
                                scalar => Map::from_iter([("value".to_string(), scalar.clone())]),
                            };
                            row.insert("key".into(), Value::String(key.clone()));
                            rows.push(row);
                        }
                    }
                    scalar => {
                        rows.push(Map::from_iter([
                            ("key".to_string(), Value::String(key.clone())),
                            ("value".to_string(), scalar.clone()),
                        ]));
                    }
                }
            }
            Some(rows)
        }
        _ => None,
    }
}

/// Union of the row keys, in first-seen order with `key` leading.
fn csv_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    if rows.iter().any(|row| row.contains_key("key")) {
        columns.push("key".to_string());
    }
    for row in rows {
        for name in row.keys() {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

fn write_csv(data: &Value, path: &Path) -> Result<(), ExportError> {
    let Some(rows) = csv_rows(data) else {
        return write_file(path, &render_lines(data));
    };

    let mut writer = csv::Writer::from_path(path)?;
    let columns = csv_columns(&rows);
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for row in &rows {
        writer.write_record(columns.iter().map(|c| row.get(c).map(scalar_text).unwrap_or_default()))?;
    }
    writer.flush().map_err(|source| ExportError::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

// --- TXT ---

fn render_lines(data: &Value) -> String {
    match data {
        Value::Array(items) => items.iter().map(|item| format!("{}\n", scalar_text(item))).collect(),
        other => scalar_text(other),
    }
}

fn render_txt(data: &Value) -> String {
    match data {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}: {}\n", scalar_text(value)))
            .collect(),
        other => render_lines(other),
    }
}

// --- HTML ---

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn html_cell(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => {
            let text = value.to_string();
            if text.chars().count() > HTML_CELL_LIMIT {
                let cut: String = text.chars().take(HTML_CELL_LIMIT).collect();
                escape_html(&format!("{cut}..."))
            } else {
                escape_html(&text)
            }
        }
        scalar => escape_html(&scalar_text(scalar)),
    }
}

const HTML_STYLE: &str = r#"
    body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; margin: 0; padding: 20px; background: #f5f5f5; }
    .container { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 0 20px rgba(0,0,0,0.1); }
    .header { text-align: center; border-bottom: 3px solid #007bff; padding-bottom: 20px; margin-bottom: 30px; }
    .header h1 { color: #007bff; margin: 0; }
    .subtitle { color: #666; }
    .section { margin-bottom: 30px; padding: 20px; background: #f8f9fa; border-radius: 5px; border-left: 4px solid #007bff; }
    .section h2 { color: #343a40; margin-top: 0; }
    .data-table { width: 100%; border-collapse: collapse; margin-top: 10px; }
    .data-table th { background: #007bff; color: white; padding: 12px; text-align: left; }
    .data-table td { padding: 10px; border: 1px solid #dee2e6; }
    .data-table tr:nth-child(even) { background: #f2f2f2; }
    .footer { text-align: center; margin-top: 40px; padding-top: 20px; border-top: 1px solid #dee2e6; color: #666; font-size: 0.9em; }
"#;

fn render_html(data: &Value) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>ReconX Report - {timestamp}</title>\n<style>{HTML_STYLE}</style>\n</head>\n<body>\n\
         <div class=\"container\">\n<div class=\"header\">\n<h1>ReconX Report</h1>\n\
         <div class=\"subtitle\">Generated {timestamp}</div>\n</div>\n"
    );

    match data {
        Value::Object(map) => {
            for (key, value) in map {
                let _ = write!(html, "<div class=\"section\">\n<h2>{}</h2>\n", escape_html(key));
                render_html_section(&mut html, value);
                html.push_str("</div>\n");
            }
        }
        other => {
            html.push_str("<div class=\"section\">\n");
            render_html_section(&mut html, other);
            html.push_str("</div>\n");
        }
    }

    html.push_str(
        "<div class=\"footer\">\n<p>Generated by ReconX</p>\n\
         <p>For authorised testing and educational use only.</p>\n</div>\n</div>\n</body>\n</html>\n",
    );
    html
}

fn render_html_section(html: &mut String, value: &Value) {
    match value {
        Value::Array(items) => {
            let _ = writeln!(html, "<p>Items: {}</p>", items.len());
            if items.first().is_some_and(Value::is_object) {
                render_html_table(html, items);
            } else if !items.is_empty() {
                html.push_str("<ul>\n");
                for item in items.iter().take(HTML_LIST_LIMIT) {
                    let _ = writeln!(html, "<li>{}</li>", html_cell(item));
                }
                html.push_str("</ul>\n");
                if items.len() > HTML_LIST_LIMIT {
                    let _ = writeln!(html, "<p>... and {} more</p>", items.len() - HTML_LIST_LIMIT);
                }
            }
        }
        Value::Object(map) => {
            html.push_str("<table class=\"data-table\"><tbody>\n");
            for (k, v) in map {
                let _ = writeln!(html, "<tr><td><strong>{}</strong></td><td>{}</td></tr>", escape_html(k), html_cell(v));
            }
            html.push_str("</tbody></table>\n");
        }
        scalar => {
            let _ = writeln!(html, "<p>{}</p>", html_cell(scalar));
        }
    }
}

/// Columns come from the first row.
fn render_html_table(html: &mut String, items: &[Value]) {
    let columns: Vec<&String> = items
        .first()
        .and_then(Value::as_object)
        .map(|first| first.keys().collect())
        .unwrap_or_default();

    html.push_str("<table class=\"data-table\">\n<thead><tr>");
    for column in &columns {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for item in items.iter().take(HTML_TABLE_LIMIT) {
        html.push_str("<tr>");
        for column in &columns {
            let cell = item.get(column.as_str()).map(html_cell).unwrap_or_default();
            let _ = write!(html, "<td>{cell}</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    if items.len() > HTML_TABLE_LIMIT {
        let _ = writeln!(html, "<p>... and {} more rows</p>", items.len() - HTML_TABLE_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn auto_format_follows_the_extension() {
        assert_eq!(ExportFormat::resolve("auto", Path::new("out.csv")).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::resolve("auto", Path::new("out")).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::resolve("HTML", Path::new("out.json")).unwrap(), ExportFormat::Html);
        assert!(matches!(
            ExportFormat::resolve("auto", Path::new("out.xml")),
            Err(ExportError::UnsupportedFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn json_export_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/report.json");
        let data = json!({"domain": "example.com", "subdomains": ["example.com", "www.example.com"]});

        assert_eq!(save(&data, &path, "auto").unwrap(), ExportFormat::Json);
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, data);
    }

    #[test]
    fn unsupported_format_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        assert!(matches!(save(&json!([]), &path, "yaml"), Err(ExportError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }

    #[test]
    fn csv_of_scalars_is_one_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subs.csv");
        save(&json!(["a.example.com", "b.example.com"]), &path, "csv").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a.example.com\nb.example.com\n");
    }

    #[test]
    fn csv_of_objects_uses_the_union_of_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("techs.csv");
        let data = json!([{"name": "Nginx", "version": "1.25"}, {"category": "CDN", "name": "Cloudflare"}]);
        save(&data, &path, "csv").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["name,version,category", "Nginx,1.25,", "Cloudflare,,CDN"]);
    }

    #[test]
    fn csv_of_object_flattens_into_key_rows() {
        let data = json!({
            "domain": "example.com",
            "ports": {"22": "SSH"},
            "subdomains": ["www.example.com"],
        });
        let rows = csv_rows(&data).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["key"], "domain");
        assert_eq!(rows[0]["value"], "example.com");
        assert_eq!(rows[1]["22"], "SSH");
        assert_eq!(rows[2]["value"], "www.example.com");
        assert_eq!(csv_columns(&rows), vec!["key", "value", "22"]);
    }

    #[test]
    fn txt_writes_key_value_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        save(&json!({"domain": "example.com", "open": 2}), &path, "txt").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "domain: example.com\nopen: 2\n");
    }

    #[test]
    fn html_escapes_content_and_truncates_lists() {
        let items: Vec<String> = (0..60).map(|i| format!("host{i}.example.com")).collect();
        let data = json!({"title": "<script>alert(1)</script>", "subdomains": items});
        let html = render_html(&data);

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("host49.example.com"));
        assert!(!html.contains("host50.example.com"));
        assert!(html.contains("... and 10 more"));
    }

    #[test]
    fn html_tables_stop_at_twenty_rows() {
        let rows: Vec<Value> = (0..25).map(|i| json!({"port": i, "service": "svc"})).collect();
        let html = render_html(&json!({"ports": rows}));
        assert_eq!(html.matches("<td>svc</td>").count(), HTML_TABLE_LIMIT);
        assert!(html.contains("... and 5 more rows"));
    }

    #[test]
    fn write_failure_is_an_io_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be overwritten as a file.
        let path: PathBuf = dir.path().to_path_buf();
        assert!(matches!(save(&json!({}), &path, "json"), Err(ExportError::Io { .. })));
    }

    #[test]
    fn json_input_is_parsed_and_text_input_is_kept_verbatim() {
        let parsed = parse_input(r#"{"open": [22, 80]}"#, Path::new("scan.JSON")).unwrap();
        assert_eq!(parsed, json!({ "open": [22, 80] }));

        let text = parse_input("not json", Path::new("notes.txt")).unwrap();
        assert_eq!(text, Value::String("not json".to_string()));

        assert!(matches!(parse_input("not json", Path::new("bad.json")), Err(ExportError::Json(_))));
    }
}
