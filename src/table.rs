//! Reading header-first tabular files
//!
//! Two dialects occur in practice:
//! - merged tables: comma separated, fields optionally quoted (`"a, b"`,
//!   `""` for a literal quote), quoted fields may span lines
//! - per-project dumps: tab separated, no quoting at all

use crate::error::{Result, RulesetError};
use std::fs;
use std::path::{Path, PathBuf};

/// Field separation and quoting rules of a table file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `,`-separated with RFC 4180 quoting
    Comma,
    /// `\t`-separated, quotes are ordinary characters
    Tab,
}

/// A parsed table: header row plus data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Path, dialect: Dialect) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, dialect, path)
    }

    /// Parse `text`; `path` is only used in error messages
    pub fn parse(text: &str, dialect: Dialect, path: &Path) -> Result<Self> {
        let mut records = match dialect {
            Dialect::Comma => parse_quoted(text, ',', path)?,
            Dialect::Tab => parse_plain(text, '\t'),
        }
        .into_iter();

        let headers = records
            .next()
            .map(|h| h.into_iter().map(|f| f.trim().to_string()).collect())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows: records.collect(),
        })
    }

    /// Position of a required column
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| RulesetError::MissingColumn {
                column: name.to_string(),
                path: self.path.clone(),
            })
    }

    /// Position of an optional column
    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Field `index` of `row`, empty when the row is short
pub fn field(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn parse_plain(text: &str, delimiter: char) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(delimiter).map(str::to_string).collect())
        .collect()
}

fn parse_quoted(text: &str, delimiter: char, path: &Path) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted_field = false;
    let mut line = 1;
    let mut quote_line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted_field => {
                in_quotes = true;
                quoted_field = true;
                quote_line = line;
            }
            c if c == delimiter => {
                record.push(std::mem::take(&mut field));
                quoted_field = false;
            }
            '\r' => {}
            '\n' => {
                line += 1;
                end_record(&mut records, &mut record, &mut field, quoted_field);
                quoted_field = false;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(RulesetError::MalformedRow {
            line: quote_line,
            path: path.to_path_buf(),
            reason: "unterminated quoted field".to_string(),
        });
    }
    end_record(&mut records, &mut record, &mut field, quoted_field);

    Ok(records)
}

fn end_record(
    records: &mut Vec<Vec<String>>,
    record: &mut Vec<String>,
    field: &mut String,
    quoted_field: bool,
) {
    if record.is_empty() && field.is_empty() && !quoted_field {
        return;
    }
    record.push(std::mem::take(field));
    records.push(std::mem::take(record));
}
