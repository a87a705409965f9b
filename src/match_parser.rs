use crate::errors::Result;
use crate::scanner::RawMatchLine;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

/// A single parsed search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// The file containing the match.
    pub file_path: PathBuf,
    /// 1-based line number of the match.
    pub line_number: usize,
    /// The matching line with surrounding whitespace removed.
    pub preview: String,
}

/// Turns `<path>:<lineNumber>:<content>` lines into [`MatchRecord`]s.
///
/// The path is the shortest prefix followed by `:<digits>:`, so a path that
/// itself contains such a sequence is split early. Everything after the line
/// number, colons included, is the preview.
pub struct MatchParser {
    line_shape: Regex,
}

impl MatchParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            line_shape: Regex::new(r"^(.*?):(\d+):(.*)$")?,
        })
    }

    /// Parses one raw line, returning `None` for anything malformed.
    pub fn parse_line(&self, line: &str) -> Option<MatchRecord> {
        let caps = self.line_shape.captures(line)?;
        let file_path = caps.get(1)?.as_str();
        if file_path.is_empty() {
            return None;
        }

        let line_number = caps.get(2)?.as_str().parse::<usize>().ok()?;
        if line_number == 0 {
            return None;
        }

        Some(MatchRecord {
            file_path: PathBuf::from(file_path),
            line_number,
            preview: caps.get(3)?.as_str().trim().to_string(),
        })
    }

    /// Parses every raw line, silently dropping the ones that don't fit.
    pub fn parse_all<'a, I>(&self, lines: I) -> Vec<MatchRecord>
    where
        I: IntoIterator<Item = &'a RawMatchLine>,
    {
        lines
            .into_iter()
            .filter_map(|raw| self.parse_line(&raw.text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_line() {
        let parser = MatchParser::new().unwrap();
        let record = parser
            .parse_line("app/Foo.php:3:  class Foo { OldName $x; }  ")
            .unwrap();

        assert_eq!(
            record,
            MatchRecord {
                file_path: PathBuf::from("app/Foo.php"),
                line_number: 3,
                preview: "class Foo { OldName $x; }".to_string(),
            }
        );
    }

    #[test]
    fn test_preview_keeps_embedded_colons() {
        let parser = MatchParser::new().unwrap();
        let record = parser
            .parse_line("routes/web.php:12:Route::get('/a:b', Home::class);")
            .unwrap();

        assert_eq!(record.file_path, PathBuf::from("routes/web.php"));
        assert_eq!(record.line_number, 12);
        assert_eq!(record.preview, "Route::get('/a:b', Home::class);");
    }

    #[test]
    fn test_colon_in_path_without_digits() {
        let parser = MatchParser::new().unwrap();
        let record = parser.parse_line(r"C:\proj\app\A.php:7:echo 1;").unwrap();
        assert_eq!(record.file_path, PathBuf::from(r"C:\proj\app\A.php"));
        assert_eq!(record.line_number, 7);
    }

    #[test]
    fn test_path_with_colon_digits_splits_early() {
        let parser = MatchParser::new().unwrap();
        let record = parser.parse_line("odd:12:name.php:4:text").unwrap();
        assert_eq!(record.file_path, PathBuf::from("odd"));
        assert_eq!(record.line_number, 12);
        assert_eq!(record.preview, "name.php:4:text");
    }

    #[test]
    fn test_malformed_lines_dropped() {
        let parser = MatchParser::new().unwrap();
        assert!(parser.parse_line("").is_none());
        assert!(parser.parse_line("no colons here").is_none());
        assert!(parser.parse_line("file.php:abc:content").is_none());
        assert!(parser.parse_line("file.php:0:content").is_none());
        assert!(parser.parse_line(":3:content").is_none());
        assert!(parser
            .parse_line("file.php:99999999999999999999999999:content")
            .is_none());
    }

    #[test]
    fn test_parse_all_keeps_order_and_drops_garbage() {
        let parser = MatchParser::new().unwrap();
        let raw: Vec<RawMatchLine> = vec![
            "b.php:2:second".into(),
            "garbage".into(),
            "a.php:1:first".into(),
        ];

        let records = parser.parse_all(&raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_path, PathBuf::from("b.php"));
        assert_eq!(records[1].preview, "first");
    }
}
