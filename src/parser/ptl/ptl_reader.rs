use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use super::schema::tokenize;
use crate::database::{ColumnSchema, GridIndex, PointMap};
use crate::error::ParseError;

/// Counters collected while ingesting a PTL file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines_read: usize,          // Non-blank lines seen
    pub records_accepted: usize,    // Lines that produced a point (including overwrites)
    pub lines_skipped: usize,       // Short or malformed lines
    pub duplicates: usize,          // Records that replaced an earlier point with the same (i, j)
}

pub struct PtlParser;  // Reader for whitespace/comma separated PTL point lists

impl PtlParser {
    // Public method to parse a PTL file from disk
    pub fn parse_file<P: AsRef<Path>>(
        path: P,
        schema: &ColumnSchema,
        negate_z: bool,
    ) -> Result<PointMap, ParseError> {
        let path = path.as_ref();
        let ptl_file = File::open(path)?;                               // Opens file and ? propagates errors
        let (points, stats) = Self::parse_reader_with_stats(BufReader::new(ptl_file), schema, negate_z)?;
        info!(
            "Read {} points from {} ({} lines, {} skipped, {} duplicate indices)",
            points.len(),
            path.display(),
            stats.lines_read,
            stats.lines_skipped,
            stats.duplicates
        );
        Ok(points)
    }

    /// Build the point map from any buffered byte stream
    pub fn parse_reader<R: BufRead>(
        reader: R,
        schema: &ColumnSchema,
        negate_z: bool,
    ) -> Result<PointMap, ParseError> {
        Self::parse_reader_with_stats(reader, schema, negate_z).map(|(points, _)| points)
    }

    /// Build the point map and report how many lines were kept or dropped.
    /// Short or unparsable lines are skipped; only read failures are errors.
    pub fn parse_reader_with_stats<R: BufRead>(
        reader: R,
        schema: &ColumnSchema,
        negate_z: bool,
    ) -> Result<(PointMap, IngestStats), ParseError> {
        let mut points = PointMap::new();
        let mut stats = IngestStats::default();
        let min_columns = schema.min_columns();

        for (line_no, raw) in reader.split(b'\n').enumerate() {
            let raw = raw?;                                             // I/O errors are fatal, content errors are not
            let line = String::from_utf8_lossy(&raw);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            stats.lines_read += 1;

            let tokens: Vec<&str> = tokenize(trimmed).collect();
            if tokens.len() < min_columns {
                debug!("Line {}: {} columns, need {}; skipped", line_no + 1, tokens.len(), min_columns);
                stats.lines_skipped += 1;
                continue;
            }

            let Some((index, coords)) = Self::parse_record(&tokens, schema, negate_z) else {
                debug!("Line {}: unparsable record; skipped", line_no + 1);
                stats.lines_skipped += 1;
                continue;
            };

            if points.insert(index, coords).is_some() {
                stats.duplicates += 1;                                  // Last write wins
            }
            stats.records_accepted += 1;
        }

        Ok((points, stats))
    }

    // Read the five schema fields of one tokenized record, None if any fails to parse
    fn parse_record(
        tokens: &[&str],
        schema: &ColumnSchema,
        negate_z: bool,
    ) -> Option<(GridIndex, [f64; 3])> {
        let x = tokens[schema.x].parse::<f64>().ok()?;
        let y = tokens[schema.y].parse::<f64>().ok()?;
        let z = tokens[schema.z].parse::<f64>().ok()?;
        let i = tokens[schema.i].parse::<i64>().ok()?;
        let j = tokens[schema.j].parse::<i64>().ok()?;

        let z = if negate_z { -z } else { z };                          // Depth-positive convention of TSurf
        Some(((i, j), [x, y, z]))
    }

    /// Rewrite CRLF and lone CR line endings as LF, in place.
    /// The file is only touched when its content changes. Returns whether it was rewritten.
    pub fn normalize_line_endings<P: AsRef<Path>>(path: P) -> Result<bool, ParseError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        if !bytes.contains(&b'\r') {
            return Ok(false);
        }

        let mut normalized = Vec::with_capacity(bytes.len());
        let mut iter = bytes.iter().peekable();
        while let Some(&b) = iter.next() {
            if b == b'\r' {
                if iter.peek() == Some(&&b'\n') {
                    iter.next();
                }
                normalized.push(b'\n');
            } else {
                normalized.push(b);
            }
        }

        fs::write(path, &normalized)?;
        debug!("Normalized line endings of {}", path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(input: &str, negate_z: bool) -> PointMap {
        PtlParser::parse_reader(Cursor::new(input), &ColumnSchema::default(), negate_z).unwrap()
    }

    #[test]
    fn negates_z_by_default_convention() {
        let points = parse("1.0 2.0 3.0 0 0\n", true);
        assert_eq!(points[&(0, 0)], [1.0, 2.0, -3.0]);

        let points = parse("1.0 2.0 3.0 0 0\n", false);
        assert_eq!(points[&(0, 0)], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn skips_short_blank_and_malformed_lines() {
        let input = "\n\
            # header line\n\
            1 2 3 0\n\
            1 2 abc 0 0\n\
            1 2 3 0.5 0\n\
            \t \n\
            4 5 6 1 1 extra columns\n";
        let (points, stats) =
            PtlParser::parse_reader_with_stats(Cursor::new(input), &ColumnSchema::default(), false).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[&(1, 1)], [4.0, 5.0, 6.0]);
        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.lines_skipped, 4);
        assert_eq!(stats.records_accepted, 1);
    }

    #[test]
    fn duplicate_index_last_write_wins() {
        let (points, stats) = PtlParser::parse_reader_with_stats(
            Cursor::new("1 1 1 2 3\n9 9 9 2 3\n"),
            &ColumnSchema::default(),
            false,
        )
        .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[&(2, 3)], [9.0, 9.0, 9.0]);
        assert_eq!(stats.duplicates, 1);
    }

    #[test]
    fn honours_schema_positions_and_commas() {
        let schema = ColumnSchema::parse("i j x y z").unwrap();
        let points = PtlParser::parse_reader(Cursor::new("4,-2,10.5,20.25,7\n"), &schema, true).unwrap();
        assert_eq!(points[&(4, -2)], [10.5, 20.25, -7.0]);
    }

    #[test]
    fn tolerates_crlf_and_invalid_utf8() {
        let mut input = b"1 2 3 0 0\r\n".to_vec();
        input.extend_from_slice(b"\xff\xfe 2 3 1 0\n");
        input.extend_from_slice(b"5 6 7 1 1");
        let points = PtlParser::parse_reader(Cursor::new(input), &ColumnSchema::default(), false).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[&(1, 1)], [5.0, 6.0, 7.0]);
    }

    #[test]
    fn empty_input_gives_empty_map() {
        assert!(parse("", true).is_empty());
        assert!(parse("not a record\n", true).is_empty());
    }

    #[test]
    fn normalize_line_endings_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.ptl");
        fs::write(&path, b"a\r\nb\rc\n").unwrap();

        assert!(PtlParser::normalize_line_endings(&path).unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"a\nb\nc\n");
        assert!(!PtlParser::normalize_line_endings(&path).unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"a\nb\nc\n");
    }
}
