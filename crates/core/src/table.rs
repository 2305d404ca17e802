//! Encoding-tolerant CSV ingestion.
//!
//! Uploaded tables come from Korean public-data portals in EUC-KR / CP949,
//! UTF-8, or UTF-8 with a BOM. The caller may name the encoding explicitly;
//! otherwise [`decode_text`] tries the candidates in a fixed order and only
//! accepts a decode whose content looks like real text (see
//! [`hangul_confidence`]), so a wrong-but-parseable decode is rejected
//! instead of silently corrupting region names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Encodings
// ---------------------------------------------------------------------------

/// Minimum [`hangul_confidence`] for an automatically detected decode.
pub const MIN_CONFIDENCE: f64 = 0.6;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text encodings accepted for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    /// EUC-KR, decoded with the CP949 (windows-949) superset.
    #[serde(rename = "euc-kr", alias = "cp949")]
    EucKr,
}

impl TextEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::EucKr => "euc-kr",
        }
    }

    /// Parse a user-supplied encoding name (case-insensitive, `_` or `-`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(TextEncoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Some(TextEncoding::Utf8Sig),
            "euc-kr" | "euckr" | "cp949" | "ms949" | "windows-949" => Some(TextEncoding::EucKr),
            _ => None,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either a user-confirmed encoding or automatic detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingChoice {
    #[default]
    Auto,
    Explicit(TextEncoding),
}

impl EncodingChoice {
    /// `"auto"` (or empty) selects detection; anything else must name a
    /// supported encoding.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(EncodingChoice::Auto);
        }
        TextEncoding::parse(trimmed)
            .map(EncodingChoice::Explicit)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unsupported encoding '{trimmed}'. Expected one of: auto, utf-8, utf-8-sig, euc-kr"
                ))
            })
    }
}

/// Result of decoding an upload.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
    /// Content score in `0.0..=1.0`; `1.0` for explicit choices.
    pub confidence: f64,
}

/// Share of "meaningful" non-ASCII characters that are Hangul.
///
/// Whitespace and ASCII are ignored. Text with no non-ASCII characters
/// scores `1.0` (every candidate decodes it identically).
pub fn hangul_confidence(text: &str) -> f64 {
    let mut total = 0usize;
    let mut hangul = 0usize;
    for c in text.chars() {
        if c.is_ascii() || c.is_whitespace() || c == '\u{FEFF}' {
            continue;
        }
        total += 1;
        if is_hangul(c) {
            hangul += 1;
        }
    }
    if total == 0 {
        1.0
    } else {
        hangul as f64 / total as f64
    }
}

fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{AC00}'..='\u{D7A3}'   // syllables
        | '\u{1100}'..='\u{11FF}' // jamo
        | '\u{3130}'..='\u{318F}' // compatibility jamo
    )
}

/// Strictly decode `bytes` with a single encoding.
fn decode_strict(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf8 => encoding_rs::UTF_8
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|s| s.into_owned()),
        TextEncoding::Utf8Sig => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            encoding_rs::UTF_8
                .decode_without_bom_handling_and_without_replacement(body)
                .map(|s| s.into_owned())
        }
        TextEncoding::EucKr => encoding_rs::EUC_KR
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|s| s.into_owned()),
    }
}

/// Decode uploaded bytes to text.
///
/// * Explicit choice: decode strictly, fail on any malformed sequence.
/// * `Auto`: a UTF-8 BOM selects `utf-8-sig`; otherwise strict UTF-8,
///   then strict EUC-KR. Each candidate must score at least
///   [`MIN_CONFIDENCE`].
pub fn decode_text(bytes: &[u8], choice: EncodingChoice) -> Result<DecodedText, CoreError> {
    if let EncodingChoice::Explicit(encoding) = choice {
        let text = decode_strict(bytes, encoding).ok_or_else(|| {
            CoreError::Decode(format!("File is not valid {encoding} text"))
        })?;
        return Ok(DecodedText {
            text,
            encoding,
            confidence: 1.0,
        });
    }

    let candidates: &[TextEncoding] = if bytes.starts_with(UTF8_BOM) {
        &[TextEncoding::Utf8Sig]
    } else {
        &[TextEncoding::Utf8, TextEncoding::EucKr]
    };

    let mut attempts = Vec::with_capacity(candidates.len());
    for &encoding in candidates {
        match decode_strict(bytes, encoding) {
            Some(text) => {
                let confidence = hangul_confidence(&text);
                if confidence >= MIN_CONFIDENCE {
                    return Ok(DecodedText {
                        text,
                        encoding,
                        confidence,
                    });
                }
                attempts.push(format!("{encoding} (confidence {confidence:.2})"));
            }
            None => attempts.push(format!("{encoding} (malformed)")),
        }
    }

    Err(CoreError::Decode(format!(
        "Could not detect the file encoding; tried {}. Choose the encoding explicitly.",
        attempts.join(", ")
    )))
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Options for [`read_table`].
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub encoding: EncodingChoice,
    /// Line promoted to the header; earlier lines are dropped.
    pub header_row: usize,
    /// Source header → canonical header.
    pub renames: BTreeMap<String, String>,
}

/// A rectangular table of string cells with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding or truncating rows to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column whose header equals `name` exactly.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of the first column whose header satisfies `pred`.
    pub fn find_column(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| pred(h))
    }

    /// Like [`column_index`](Self::column_index) but yields a
    /// `Validation` error naming the missing column.
    pub fn require_column(&self, name: &str) -> Result<usize, CoreError> {
        self.column_index(name)
            .ok_or_else(|| CoreError::Validation(format!("Column '{name}' not found")))
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Decode and parse an uploaded CSV file.
///
/// Returns the table together with the detected encoding and confidence.
pub fn read_table(bytes: &[u8], options: &IngestOptions) -> Result<(Table, DecodedText), CoreError> {
    let decoded = decode_text(bytes, options.encoding)?;
    let table = parse_csv(&decoded.text, options)?;
    Ok((table, decoded))
}

/// Parse already-decoded CSV text into a [`Table`].
pub fn parse_csv(text: &str, options: &IngestOptions) -> Result<Table, CoreError> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            CoreError::Validation(format!("Malformed CSV at record {}: {e}", line + 1))
        })?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if options.header_row >= records.len() {
        return Err(CoreError::Validation(format!(
            "Header row {} does not exist; the file has {} line(s)",
            options.header_row,
            records.len()
        )));
    }

    let mut records = records.into_iter().skip(options.header_row);
    let headers: Vec<String> = records
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| {
            let h = h.trim().to_string();
            options.renames.get(&h).cloned().unwrap_or(h)
        })
        .collect();

    let rows: Vec<Vec<String>> = records
        .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
        .collect();

    Ok(Table::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn euc_kr(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = encoding_rs::EUC_KR.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn auto_detects_utf8() {
        let decoded = decode_text("행정구역,총인구수\n".as_bytes(), EncodingChoice::Auto).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert_eq!(decoded.confidence, 1.0);
    }

    #[test]
    fn auto_detects_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("지점,2024.01.01\n".as_bytes());
        let decoded = decode_text(&bytes, EncodingChoice::Auto).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Utf8Sig);
        assert!(decoded.text.starts_with("지점"));
    }

    #[test]
    fn auto_detects_euc_kr() {
        let bytes = euc_kr("행정구역,2025년06월_남_0세\n서울특별시 종로구,\"1,234\"\n");
        let decoded = decode_text(&bytes, EncodingChoice::Auto).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::EucKr);
        assert!(decoded.text.contains("서울특별시 종로구"));
        assert!(decoded.confidence >= MIN_CONFIDENCE);
    }

    #[test]
    fn explicit_choice_is_strict() {
        let bytes = euc_kr("행정구역");
        let result = decode_text(&bytes, EncodingChoice::Explicit(TextEncoding::Utf8));
        assert_matches!(result, Err(CoreError::Decode(_)));
    }

    #[test]
    fn low_confidence_decode_is_rejected() {
        // Latin-1 "café" is invalid UTF-8 and invalid EUC-KR.
        let bytes = b"caf\xe9,1\n";
        assert_matches!(
            decode_text(bytes, EncodingChoice::Auto),
            Err(CoreError::Decode(msg)) if msg.contains("euc-kr")
        );
    }

    #[test]
    fn confidence_scoring() {
        assert_eq!(hangul_confidence("abc, 123"), 1.0);
        assert_eq!(hangul_confidence("서울"), 1.0);
        assert_eq!(hangul_confidence("서¤"), 0.5);
    }

    #[test]
    fn encoding_choice_parsing() {
        assert_eq!(EncodingChoice::parse("").unwrap(), EncodingChoice::Auto);
        assert_eq!(
            EncodingChoice::parse("CP949").unwrap(),
            EncodingChoice::Explicit(TextEncoding::EucKr)
        );
        assert_eq!(
            EncodingChoice::parse("utf_8_sig").unwrap(),
            EncodingChoice::Explicit(TextEncoding::Utf8Sig)
        );
        assert!(EncodingChoice::parse("latin1").is_err());
    }

    #[test]
    fn parses_quoted_cells_and_pads_short_rows() {
        let table = parse_csv(
            "행정구역,총인구수,세대수\n\"서울특별시 (1100000000)\",\"9,411,035\"\n",
            &IngestOptions::default(),
        )
        .unwrap();
        assert_eq!(table.headers(), &["행정구역", "총인구수", "세대수"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 1), "9,411,035");
        assert_eq!(table.cell(0, 2), "");
    }

    #[test]
    fn promotes_second_row_to_header_and_renames() {
        let mut renames = BTreeMap::new();
        renames.insert("관측지점별(1)".to_string(), "지점".to_string());
        let options = IngestOptions {
            header_row: 1,
            renames,
            ..Default::default()
        };
        let table = parse_csv(
            "통계표,기온,기온\n관측지점별(1), 2024.01.01 ,2024.01.02\n서울,1.5,2.0\n",
            &options,
        )
        .unwrap();
        assert_eq!(table.headers(), &["지점", "2024.01.01", "2024.01.02"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.column_index("지점"), Some(0));
    }

    #[test]
    fn missing_header_row_is_an_error() {
        let options = IngestOptions {
            header_row: 3,
            ..Default::default()
        };
        assert_matches!(parse_csv("a,b\n", &options), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let table = parse_csv("a,b\n1,2\n,\n3,4\n", &IngestOptions::default()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn read_table_reports_encoding() {
        let bytes = euc_kr("지역,값\n서울,1\n");
        let (table, decoded) = read_table(&bytes, &IngestOptions::default()).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::EucKr);
        assert_eq!(table.cell(0, 0), "서울");
    }
}
