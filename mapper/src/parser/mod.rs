//! Tabular source reader with encoding and delimiter auto-detection.
//!
//! Turns delimited text into [`Row`]s. The first record is the header line;
//! quoted fields may contain the delimiter. Rows with the wrong number of
//! fields are kept: missing trailing fields read as empty, extra fields are
//! dropped.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// Reader options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Field delimiter; `None` auto-detects from the header line.
    pub delimiter: Option<char>,
}

impl ReadOptions {
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }
}

/// A parsed source with metadata.
#[derive(Debug, Clone)]
pub struct TabularSource {
    /// Column headers, in file order
    pub headers: Vec<String>,
    /// Data rows, in file order
    pub rows: Vec<Row>,
    /// Detected or assumed encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

// =============================================================================
// Rows
// =============================================================================

/// One data row.
///
/// The flat field map is the only stored data. The nested view, where
/// `"room.name"` becomes `room -> name`, is derived from it on first use and
/// never written to directly, so both views always agree.
#[derive(Debug, Clone, Default)]
pub struct Row {
    fields: Map<String, Value>,
    nested: OnceCell<Value>,
}

impl Row {
    /// Build a row from `(field, value)` pairs. Later duplicates win.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self {
            fields,
            nested: OnceCell::new(),
        }
    }

    /// Flat lookup by exact field name.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Walk the nested view segment by segment. Returns `None` when a
    /// segment is missing or the path ends on a sub-object.
    pub fn get_path(&self, segments: &[&str]) -> Option<&str> {
        let mut node = self.nested();
        for segment in segments {
            node = node.as_object()?.get(*segment)?;
        }
        node.as_str()
    }

    /// Nested view of the row, computed once.
    pub fn nested(&self) -> &Value {
        self.nested.get_or_init(|| build_nested(&self.fields))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flat view as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Plain field names become leaves first, then dotted names are inserted as
/// paths. A path that runs into an existing leaf is left out of the nested
/// view; lookups for it fall back to the flat field.
fn build_nested(fields: &Map<String, Value>) -> Value {
    let mut root = Map::new();

    for (key, value) in fields.iter().filter(|(k, _)| !k.contains('.')) {
        root.insert(key.clone(), value.clone());
    }

    for (key, value) in fields.iter().filter(|(k, _)| k.contains('.')) {
        let segments: Vec<&str> = key.split('.').collect();
        insert_path(&mut root, &segments, value);
    }

    Value::Object(root)
}

fn insert_path(node: &mut Map<String, Value>, segments: &[&str], value: &Value) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };

    if rest.is_empty() {
        if node.contains_key(*first) {
            return false;
        }
        node.insert(first.to_string(), value.clone());
        return true;
    }

    match node
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(child) => insert_path(child, rest, value),
        _ => false,
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        // charsets encoding_rs cannot decode are read as UTF-8
        _ if encoding_rs::Encoding::for_label(charset.as_bytes()).is_none() => "utf-8".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding. Fails only on an
/// unknown encoding label.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => return Err(CsvError::Encoding(format!("unsupported encoding '{}'", other))),
        },
    };
    Ok(decoded)
}

/// Detect the delimiter by counting occurrences in the first line.
/// Falls back to `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse delimited text.
///
/// # Example
/// ```
/// use rmlmap::parser::{parse, ReadOptions};
///
/// let source = parse("id,name\nATC001,Aspirin", &ReadOptions::default()).unwrap();
/// assert_eq!(source.headers, vec!["id", "name"]);
/// assert_eq!(source.rows[0].get("name"), Some("Aspirin"));
/// ```
pub fn parse(content: &str, options: &ReadOptions) -> CsvResult<TabularSource> {
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(content));
    parse_with_metadata(content, delimiter, "utf-8".to_string())
}

/// Parse raw bytes, detecting the encoding first.
pub fn parse_bytes(bytes: &[u8], options: &ReadOptions) -> CsvResult<TabularSource> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let mut source = parse(&content, options)?;
    source.encoding = encoding;
    Ok(source)
}

/// Read and parse a file.
pub async fn parse_file<P: AsRef<Path>>(path: P, options: &ReadOptions) -> CsvResult<TabularSource> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    parse_bytes(&bytes, options)
}

fn parse_with_metadata(content: &str, delimiter: char, encoding: String) -> CsvResult<TabularSource> {
    if !delimiter.is_ascii() {
        return Err(CsvError::parse(1, format!("Delimiter '{}' is not ASCII", delimiter)));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header_record = match records.next() {
        Some(result) => result.map_err(|e| to_csv_error(e, 1))?,
        None => return Err(CsvError::EmptySource),
    };

    let headers: Vec<String> = header_record
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();

    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| to_csv_error(e, idx + 2))?;

        let row = Row::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string())),
        );
        rows.push(row);
    }

    Ok(TabularSource {
        headers,
        rows,
        encoding,
        delimiter,
    })
}

fn to_csv_error(err: csv::Error, fallback_line: usize) -> CsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    CsvError::parse(line, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(content: &str, delimiter: char) -> TabularSource {
        parse(content, &ReadOptions::with_delimiter(delimiter)).unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let source = parse_str("name;age\nAlice;30\nBob;25", ';');

        assert_eq!(source.rows.len(), 2);
        assert_eq!(source.rows[0].get("name"), Some("Alice"));
        assert_eq!(source.rows[0].get("age"), Some("30"));
        assert_eq!(source.rows[1].get("name"), Some("Bob"));
        assert_eq!(source.rows[1].get("age"), Some("25"));
    }

    #[test]
    fn test_quoted_field_with_delimiter() {
        let source = parse_str("id,label\n1,\"Paracetamol, 500mg\"", ',');

        assert_eq!(source.rows[0].get("label"), Some("Paracetamol, 500mg"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let source = parse_str("a,b\r\n1,2\r\n", ',');

        assert_eq!(source.headers, vec!["a", "b"]);
        assert_eq!(source.rows[0].get("b"), Some("2"));
    }

    #[test]
    fn test_missing_values() {
        let source = parse_str("a;b;c\n1;;3", ';');

        assert_eq!(source.rows[0].get("a"), Some("1"));
        assert_eq!(source.rows[0].get("b"), Some(""));
        assert_eq!(source.rows[0].get("c"), Some("3"));
    }

    #[test]
    fn test_short_row_padded_with_empty() {
        let source = parse_str("a,b,c\n1", ',');

        assert_eq!(source.rows[0].get("a"), Some("1"));
        assert_eq!(source.rows[0].get("b"), Some(""));
        assert_eq!(source.rows[0].get("c"), Some(""));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let source = parse_str("a;b\n1;2;3;4", ';');

        assert_eq!(source.rows[0].len(), 2);
        assert_eq!(source.rows[0].get("a"), Some("1"));
        assert_eq!(source.rows[0].get("b"), Some("2"));
    }

    #[test]
    fn test_empty_source_error() {
        let result = parse("", &ReadOptions::default());
        assert!(matches!(result, Err(CsvError::EmptySource)));
    }

    #[test]
    fn test_blank_headers_error() {
        let result = parse(",,\n1,2,3", &ReadOptions::with_delimiter(','));
        assert!(matches!(result, Err(CsvError::NoHeaders)));
    }

    #[test]
    fn test_headers_only() {
        let source = parse_str("id,name\n", ',');
        assert_eq!(source.headers.len(), 2);
        assert!(source.rows.is_empty());
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let source = parse("\u{feff}id,name\n1,x", &ReadOptions::default()).unwrap();
        assert_eq!(source.headers[0], "id");
    }

    #[test]
    fn test_nested_view() {
        let source = parse_str("patient.id,patient.name,ward\nP1,Ann,W3", ',');
        let row = &source.rows[0];

        assert_eq!(row.get_path(&["patient", "id"]), Some("P1"));
        assert_eq!(row.get_path(&["patient", "name"]), Some("Ann"));
        assert_eq!(row.get_path(&["ward"]), Some("W3"));
        // flat keys are still there
        assert_eq!(row.get("patient.id"), Some("P1"));
        // path ending on a sub-object is not a value
        assert_eq!(row.get_path(&["patient"]), None);
    }

    #[test]
    fn test_nested_view_skips_conflicting_path() {
        let row = Row::from_pairs([("room", "A"), ("room.name", "101")]);

        assert_eq!(row.get_path(&["room", "name"]), None);
        assert_eq!(row.get_path(&["room"]), Some("A"));
        assert_eq!(row.get("room.name"), Some("101"));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_detect_delimiter_single_column() {
        assert_eq!(detect_delimiter("id\n1"), ',');
    }

    #[test]
    fn test_auto_parse_bytes() {
        let csv = "name;age\nAlice;30\nBob;25";
        let source = parse_bytes(csv.as_bytes(), &ReadOptions::default()).unwrap();

        assert_eq!(source.delimiter, ';');
        assert_eq!(source.encoding, "utf-8");
        assert_eq!(source.rows.len(), 2);
        assert_eq!(source.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let result = decode_content(b"id\n1", "klingon");
        assert!(matches!(result, Err(CsvError::Encoding(_))));
        assert_eq!(decode_content(b"id\n1", "shift_jis").unwrap(), "id\n1");
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let result = parse("a§b\n1§2", &ReadOptions::with_delimiter('§'));
        assert!(matches!(result, Err(CsvError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meds.csv");
        std::fs::write(&path, "id,name\nATC001,Aspirin\n").unwrap();

        let source = parse_file(&path, &ReadOptions::default()).await.unwrap();
        assert_eq!(source.rows.len(), 1);
        assert_eq!(source.rows[0].get("id"), Some("ATC001"));
    }
}
