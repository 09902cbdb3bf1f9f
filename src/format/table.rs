//! Lossless reformatting of tabular artifacts.
//!
//! [`convert`] re-serializes a table, changing delimiter and/or header while
//! preserving every data cell; [`convert_to_canonical`] is the normalization
//! step adapters use to turn tool-specific output (any delimiter, header
//! optional) into the canonical schema the orchestrator guarantees between
//! stages: tab-delimited, headered, exactly two columns.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::delimiter::{detect_delimiter, has_header, Delimiter};
use crate::pipeline::errors::{PipelineError, Result};

/// What to do with the header row during a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSpec {
    /// Carry the source header through unchanged (if one exists).
    Keep,
    /// Drop the header row from the output.
    Strip,
    /// Replace (or insert) the header with the given column names.
    Set(Vec<String>),
}

/// The two artifact kinds that flow between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Undirected edge list: `{source, target}`.
    Network,
    /// Node-to-cluster mapping: `{node_id, cluster_id}`.
    Clustering,
}

impl ArtifactKind {
    /// Canonical column names for this kind.
    pub fn canonical_columns(&self) -> [&'static str; 2] {
        match self {
            Self::Network => ["source", "target"],
            Self::Clustering => ["node_id", "cluster_id"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Clustering => "clustering",
        }
    }
}

/// A table split into an optional header and data rows.
#[derive(Debug, Clone)]
pub struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

/// Read a table, using the header heuristic to decide whether the first row
/// is a header. Blank and `#`-comment lines are skipped.
pub fn read_table(path: &Path, delimiter: Delimiter) -> Result<Table> {
    let (headered, _) = has_header(path, delimiter)?;

    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut header = None;
    let mut rows = Vec::new();
    let mut seen_first = false;

    for line in reader.lines() {
        let line = line.map_err(|e| PipelineError::io(path, e))?;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
            continue;
        }
        let fields: Vec<String> = trimmed
            .split(delimiter.as_char())
            .map(str::to_string)
            .collect();
        if !seen_first {
            seen_first = true;
            if headered {
                header = Some(fields);
                continue;
            }
        }
        rows.push(fields);
    }

    Ok(Table { header, rows })
}

fn write_table(path: &Path, delimiter: Delimiter, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let sep = delimiter.as_char().to_string();
    if let Some(header) = &table.header {
        writeln!(writer, "{}", header.join(&sep)).map_err(|e| PipelineError::io(path, e))?;
    }
    for row in &table.rows {
        writeln!(writer, "{}", row.join(&sep)).map_err(|e| PipelineError::io(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

/// Re-serialize `path_in` to `path_out`, changing the delimiter and applying
/// `header`. All data cells are preserved; round-tripping back through the
/// original delimiter and header reproduces the original row values.
pub fn convert(
    path_in: &Path,
    path_out: &Path,
    target_delimiter: Delimiter,
    header: HeaderSpec,
) -> Result<()> {
    let source_delimiter = detect_delimiter(path_in)?;
    let mut table = read_table(path_in, source_delimiter)?;

    table.header = match header {
        HeaderSpec::Keep => table.header,
        HeaderSpec::Strip => None,
        HeaderSpec::Set(names) => Some(names),
    };

    debug!(
        input = %path_in.display(),
        output = %path_out.display(),
        delimiter = %target_delimiter,
        "converting table"
    );
    write_table(path_out, target_delimiter, &table)
}

/// Normalize any supported tabular input into the canonical artifact schema:
/// tab-delimited, headered with the kind's canonical column names.
///
/// The source delimiter is auto-detected and a missing header is tolerated
/// (all rows are then data). Rows that do not have exactly two columns fail
/// with [`PipelineError::SchemaValidation`] naming the path and line.
pub fn convert_to_canonical(path_in: &Path, path_out: &Path, kind: ArtifactKind) -> Result<()> {
    let source_delimiter = detect_delimiter(path_in)?;
    let mut table = read_table(path_in, source_delimiter)?;

    for (idx, row) in table.rows.iter().enumerate() {
        if row.len() != 2 {
            return Err(PipelineError::schema(
                path_in,
                format!(
                    "{} row {} has {} columns, expected 2",
                    kind.name(),
                    idx + 1,
                    row.len()
                ),
            ));
        }
    }

    let columns = kind.canonical_columns();
    table.header = Some(columns.iter().map(|s| s.to_string()).collect());

    debug!(
        input = %path_in.display(),
        output = %path_out.display(),
        kind = kind.name(),
        rows = table.rows.len(),
        "canonicalizing artifact"
    );
    write_table(path_out, Delimiter::Tab, &table)
}

/// Check that `path` already satisfies the canonical schema for `kind`:
/// tab delimiter, header row exactly matching the canonical column names.
pub fn validate_canonical(path: &Path, kind: ArtifactKind) -> Result<()> {
    let delimiter = detect_delimiter(path)?;
    if delimiter != Delimiter::Tab {
        return Err(PipelineError::schema(
            path,
            format!(
                "{} artifact must be tab-delimited, found {} delimiter",
                kind.name(),
                delimiter
            ),
        ));
    }
    let (headered, first_row) = has_header(path, Delimiter::Tab)?;
    let columns = kind.canonical_columns();
    if !headered || first_row != columns {
        return Err(PipelineError::schema(
            path,
            format!(
                "{} artifact must have header {:?}, found {:?}",
                kind.name(),
                columns,
                first_row
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn read_to_string(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_convert_changes_delimiter_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "in.csv", "source,target\n1,2\n3,4\n");
        let output = dir.path().join("out.tsv");

        convert(&input, &output, Delimiter::Tab, HeaderSpec::Keep).unwrap();
        assert_eq!(read_to_string(&output), "source\ttarget\n1\t2\n3\t4\n");
    }

    #[test]
    fn test_convert_strip_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "in.csv", "source,target\n1,2\n");
        let output = dir.path().join("out.txt");

        convert(&input, &output, Delimiter::Space, HeaderSpec::Strip).unwrap();
        assert_eq!(read_to_string(&output), "1 2\n");
    }

    #[test]
    fn test_convert_set_header_on_headerless_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "in.txt", "1 2\n3 4\n");
        let output = dir.path().join("out.tsv");

        convert(
            &input,
            &output,
            Delimiter::Tab,
            HeaderSpec::Set(vec!["node_id".into(), "cluster_id".into()]),
        )
        .unwrap();
        assert_eq!(
            read_to_string(&output),
            "node_id\tcluster_id\n1\t2\n3\t4\n"
        );
    }

    #[test]
    fn test_convert_round_trip_reproduces_rows() {
        let dir = tempfile::tempdir().unwrap();
        let original = "source,target\n10,20\n30,40\n50,60\n";
        let input = write_file(dir.path(), "a.csv", original);
        let mid = dir.path().join("b.tsv");
        let back = dir.path().join("c.csv");

        convert(&input, &mid, Delimiter::Tab, HeaderSpec::Keep).unwrap();
        convert(&mid, &back, Delimiter::Comma, HeaderSpec::Keep).unwrap();
        assert_eq!(read_to_string(&back), original);
    }

    #[test]
    fn test_canonical_network_from_each_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("a.csv", "source,target\n1,2\n2,3\n"),
            ("b.txt", "1 2\n2 3\n"),
            ("c.tsv", "source\ttarget\n1\t2\n2\t3\n"),
        ];
        for (name, content) in cases {
            let input = write_file(dir.path(), name, content);
            let output = dir.path().join(format!("{name}.out"));
            convert_to_canonical(&input, &output, ArtifactKind::Network).unwrap();
            assert_eq!(read_to_string(&output), "source\ttarget\n1\t2\n2\t3\n");
            validate_canonical(&output, ArtifactKind::Network).unwrap();
        }
    }

    #[test]
    fn test_canonical_clustering_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "com.tsv", "5\t1\n6\t1\n7\t2\n");
        let output = dir.path().join("canonical.tsv");

        convert_to_canonical(&input, &output, ArtifactKind::Clustering).unwrap();
        assert_eq!(
            read_to_string(&output),
            "node_id\tcluster_id\n5\t1\n6\t1\n7\t2\n"
        );
    }

    #[test]
    fn test_canonical_rejects_wrong_column_count() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "bad.csv", "1,2,3\n");
        let output = dir.path().join("out.tsv");

        let err = convert_to_canonical(&input, &output, ArtifactKind::Network).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaValidation { .. }));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_validate_canonical_rejects_wrong_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "bad.tsv", "node\tcluster\n1\t2\n");
        let err = validate_canonical(&input, ArtifactKind::Clustering).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaValidation { .. }));
    }

    #[test]
    fn test_validate_canonical_rejects_wrong_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "bad.csv", "source,target\n1,2\n");
        let err = validate_canonical(&input, ArtifactKind::Network).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaValidation { .. }));
    }

    #[test]
    fn test_comment_lines_dropped_during_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "in.txt", "# infomap output\n1 7\n2 7\n");
        let output = dir.path().join("out.tsv");

        convert_to_canonical(&input, &output, ArtifactKind::Clustering).unwrap();
        assert_eq!(
            read_to_string(&output),
            "node_id\tcluster_id\n1\t7\n2\t7\n"
        );
    }

    #[test]
    fn test_blank_leading_line_keeps_first_data_row() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(dir.path(), "in.txt", "\n1 7\n2 7\n");
        let output = dir.path().join("out.tsv");

        convert_to_canonical(&input, &output, ArtifactKind::Clustering).unwrap();
        assert_eq!(
            read_to_string(&output),
            "node_id\tcluster_id\n1\t7\n2\t7\n"
        );
    }
}
