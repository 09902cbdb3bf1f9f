//! Delimiter detection for tabular artifacts.
//!
//! Network and clustering files arrive from external tools with whatever
//! delimiter the producing tool prefers. [`detect_delimiter`] sniffs the
//! file by scanning lines in order and returning the first delimiter class
//! present among comma, space, and tab.
//!
//! This is a heuristic, not a parser: the fixed tie-break order
//! `comma > space > tab` must be preserved for determinism. A field value
//! that happens to contain a later-checked delimiter character is never
//! misdetected only because earlier classes are checked first.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::pipeline::errors::{PipelineError, Result};

/// A supported column delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Comma,
    Space,
    Tab,
}

impl Delimiter {
    /// The delimiter character.
    pub fn as_char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Space => ' ',
            Self::Tab => '\t',
        }
    }

    /// Human-readable name for log and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Comma => "comma",
            Self::Space => "space",
            Self::Tab => "tab",
        }
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns `true` for lines the sniffer skips: blank lines and `#` comments.
fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Detect the delimiter of a tabular file.
///
/// Scans lines in order, skipping blank and `#`-comment lines. The first
/// non-skippable line decides: comma wins over space, space wins over tab.
/// A non-skippable line containing none of the three fails with
/// [`PipelineError::UnsupportedDelimiter`], as does a file with no data
/// lines at all.
pub fn detect_delimiter(path: &Path) -> Result<Delimiter> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let reader = BufReader::new(file);

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| PipelineError::io(path, e))?;
        if is_skippable(&line) {
            continue;
        }
        if line.contains(',') {
            return Ok(Delimiter::Comma);
        }
        if line.contains(' ') {
            return Ok(Delimiter::Space);
        }
        if line.contains('\t') {
            return Ok(Delimiter::Tab);
        }
        return Err(PipelineError::UnsupportedDelimiter {
            path: path.to_path_buf(),
            line_number: idx + 1,
            line,
        });
    }

    // Nothing but blanks and comments.
    Err(PipelineError::UnsupportedDelimiter {
        path: path.to_path_buf(),
        line_number: 0,
        line: String::new(),
    })
}

/// Check whether the first data row of `path` looks like a header.
///
/// Blank and `#`-comment lines are skipped, the same set of lines every
/// table reader skips, so a comment banner ahead of headerless data is
/// never mistaken for a header. The first non-skippable row is declared a
/// header if at least one field is not a plain unsigned-integer token.
/// Known limitation: an all-numeric header row is misclassified as data.
/// Returns the header flag together with that row's fields.
pub fn has_header(path: &Path, delimiter: Delimiter) -> Result<(bool, Vec<String>)> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let reader = BufReader::new(file);

    for line in reader.lines() {
        let line = line.map_err(|e| PipelineError::io(path, e))?;
        if is_skippable(&line) {
            continue;
        }
        let fields: Vec<String> = line
            .trim_end_matches(['\n', '\r'])
            .split(delimiter.as_char())
            .map(str::to_string)
            .collect();
        let header = fields.iter().any(|f| !is_integer_token(f));
        return Ok((header, fields));
    }

    Ok((false, Vec::new()))
}

/// Non-empty and all ASCII digits.
fn is_integer_token(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_detect_comma() {
        let f = write_temp("source,target\n1,2\n");
        assert_eq!(detect_delimiter(f.path()).unwrap(), Delimiter::Comma);
    }

    #[test]
    fn test_detect_space() {
        let f = write_temp("1 2\n3 4\n");
        assert_eq!(detect_delimiter(f.path()).unwrap(), Delimiter::Space);
    }

    #[test]
    fn test_detect_tab() {
        let f = write_temp("1\t2\n3\t4\n");
        assert_eq!(detect_delimiter(f.path()).unwrap(), Delimiter::Tab);
    }

    #[test]
    fn test_comma_beats_space_and_tab() {
        let f = write_temp("a b,\tc\n");
        assert_eq!(detect_delimiter(f.path()).unwrap(), Delimiter::Comma);
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let f = write_temp("# generated by leiden\n\n1\t2\n");
        assert_eq!(detect_delimiter(f.path()).unwrap(), Delimiter::Tab);
    }

    #[test]
    fn test_unsupported_delimiter_names_line() {
        let f = write_temp("# header comment\n1;2\n");
        let err = detect_delimiter(f.path()).unwrap_err();
        match err {
            PipelineError::UnsupportedDelimiter {
                line_number, line, ..
            } => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "1;2");
            }
            other => panic!("expected UnsupportedDelimiter, got {other}"),
        }
    }

    #[test]
    fn test_empty_file_is_unsupported() {
        let f = write_temp("");
        assert!(matches!(
            detect_delimiter(f.path()),
            Err(PipelineError::UnsupportedDelimiter { .. })
        ));
    }

    #[test]
    fn test_has_header_true() {
        let f = write_temp("source,target\n1,2\n");
        let (header, row) = has_header(f.path(), Delimiter::Comma).unwrap();
        assert!(header);
        assert_eq!(row, vec!["source", "target"]);
    }

    #[test]
    fn test_has_header_false_for_numeric_row() {
        let f = write_temp("1,2\n3,4\n");
        let (header, row) = has_header(f.path(), Delimiter::Comma).unwrap();
        assert!(!header);
        assert_eq!(row, vec!["1", "2"]);
    }

    #[test]
    fn test_header_heuristic_skips_comment_banner() {
        // Community files often open with a comment line ahead of
        // headerless data; the banner must not read as a header.
        let f = write_temp("# generated by infomap\n1\t7\n2\t7\n");
        let (header, row) = has_header(f.path(), Delimiter::Tab).unwrap();
        assert!(!header);
        assert_eq!(row, vec!["1", "7"]);
    }

    #[test]
    fn test_header_heuristic_skips_blank_first_line() {
        let f = write_temp("\nsource,target\n1,2\n");
        let (header, row) = has_header(f.path(), Delimiter::Comma).unwrap();
        assert!(header);
        assert_eq!(row, vec!["source", "target"]);
    }

    #[test]
    fn test_all_skippable_file_has_no_header() {
        let f = write_temp("# only comments\n\n");
        let (header, row) = has_header(f.path(), Delimiter::Tab).unwrap();
        assert!(!header);
        assert!(row.is_empty());
    }

    #[test]
    fn test_negative_ids_classified_as_header() {
        // Known limitation of the isdigit heuristic: a leading minus sign
        // makes the field non-numeric, so the row reads as a header.
        let f = write_temp("-1,2\n");
        let (header, _) = has_header(f.path(), Delimiter::Comma).unwrap();
        assert!(header);
    }
}
