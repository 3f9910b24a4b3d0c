//! Numeric row parser with encoding auto-detection.
//!
//! Turns whitespace-delimited text into rows of `f64`. Rows may differ in
//! length; empty lines become empty rows. Flattening concatenates rows in
//! document order (line order, then token order).

use crate::error::ParseError;

/// Result of parsing raw bytes, with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    /// Decoded text, as it will be staged
    pub text: String,
    /// Detected encoding
    pub encoding: String,
    /// One entry per line
    pub rows: Vec<Vec<f64>>,
}

impl ParsedInput {
    /// Number of lines, empty ones included
    pub fn line_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of parsed values
    pub fn value_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// All values in document order
    pub fn flat(&self) -> Vec<f64> {
        flatten(&self.rows)
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "utf-16le" | "utf-16be" | "utf-16" => "utf-16".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
///
/// UTF-8 input must be well formed; single-byte encodings always decode.
/// Unknown encodings fall back to lossy UTF-8. A leading byte order mark is
/// never part of the returned text.
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<String, ParseError> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
            if had_errors {
                Err(ParseError::Encoding("malformed UTF-8 input".to_string()))
            } else {
                Ok(text.into_owned())
            }
        }
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.into_owned())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()),
        "utf-16" => {
            // BOM sniffing picks the byte order; no BOM means little endian
            let (text, _, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
            if had_errors {
                Err(ParseError::Encoding("malformed UTF-16 input".to_string()))
            } else {
                Ok(text.into_owned())
            }
        }
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }?;

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Parse one token as a 64-bit float.
fn parse_token(token: &str, line: usize) -> Result<f64, ParseError> {
    token.parse::<f64>().map_err(|_| ParseError::MalformedNumber {
        line,
        token: token.to_string(),
    })
}

/// Parse one line into a row. `line` is 1-based and only used for errors.
pub fn parse_line(text: &str, line: usize) -> Result<Vec<f64>, ParseError> {
    text.split_whitespace()
        .map(|token| parse_token(token, line))
        .collect()
}

/// Parse text into rows of floats.
///
/// # Example
/// ```
/// use hpcparse::parser::parse_rows;
///
/// let rows = parse_rows("1.2 3.4\n\n5.6").unwrap();
/// assert_eq!(rows, vec![vec![1.2, 3.4], vec![], vec![5.6]]);
/// ```
///
/// # Errors
/// [`ParseError::MalformedNumber`] for the first token that is not a number.
pub fn parse_rows(text: &str) -> Result<Vec<Vec<f64>>, ParseError> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| parse_line(line, idx + 1))
        .collect()
}

/// Concatenate rows in document order.
pub fn flatten(rows: &[Vec<f64>]) -> Vec<f64> {
    rows.iter().flatten().copied().collect()
}

/// Parse text straight into a flat series.
pub fn parse_flat(text: &str) -> Result<Vec<f64>, ParseError> {
    parse_rows(text).map(|rows| flatten(&rows))
}

/// Parse raw bytes with encoding auto-detection.
pub fn parse_bytes_auto(bytes: &[u8]) -> Result<ParsedInput, ParseError> {
    let encoding = detect_encoding(bytes);
    let text = decode_content(bytes, &encoding)?;
    let rows = parse_rows(&text)?;

    Ok(ParsedInput {
        text,
        encoding,
        rows,
    })
}
