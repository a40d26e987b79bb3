//! CSV output for matched rules and the mined ruleset

use crate::canonicalize::MatchedRule;
use crate::probe::join_apis;
use crate::ruleset::RulesetEntry;

/// Escape CSV field (handle commas, quotes, newlines)
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row(output: &mut String, fields: &[String]) {
    let escaped: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    output.push_str(&escaped.join(","));
    output.push('\n');
}

/// A matched rule together with where it was found
#[derive(Debug, Clone)]
pub struct MatchedRow {
    pub app: String,
    pub version: String,
    pub sdk_min: String,
    pub method: String,
    pub rule: MatchedRule,
}

/// Intermediate table: every canonical rule of every method
#[derive(Debug, Default)]
pub struct MatchedCsvOutput {
    rows: Vec<MatchedRow>,
}

impl MatchedCsvOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: MatchedRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn header() -> &'static str {
        "app,version,sdk_min,method,type,checked_version,true_apis,false_apis,\
         only_in_true_apis,only_in_false_apis,message,modified_files"
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(Self::header());
        output.push('\n');

        for row in &self.rows {
            let rule = &row.rule;
            push_row(
                &mut output,
                &[
                    row.app.clone(),
                    row.version.clone(),
                    row.sdk_min.clone(),
                    row.method.clone(),
                    rule.operator.symbol().to_string(),
                    rule.threshold.to_string(),
                    join_apis(&rule.true_apis),
                    join_apis(&rule.false_apis),
                    join_apis(&rule.only_in_true()),
                    join_apis(&rule.only_in_false()),
                    rule.message.clone().unwrap_or_default(),
                    rule.changed_files.to_string(),
                ],
            );
        }
        output
    }
}

/// Final ruleset table
///
/// The last column holds the representative commit message, or the `&`-joined
/// supporting applications in detailed mode.
#[derive(Debug)]
pub struct RulesetCsvOutput {
    entries: Vec<RulesetEntry>,
    detailed: bool,
}

impl RulesetCsvOutput {
    pub fn new(detailed: bool) -> Self {
        Self {
            entries: Vec::new(),
            detailed,
        }
    }

    pub fn add_entry(&mut self, entry: RulesetEntry) {
        self.entries.push(entry);
    }

    fn header(&self) -> String {
        let last = if self.detailed { "support" } else { "keywords" };
        format!("comparison,version,true_apis,false_apis,napps,{}", last)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.header());
        output.push('\n');

        for entry in &self.entries {
            let last = if self.detailed {
                entry
                    .support
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("&")
            } else {
                entry.keywords.clone()
            };
            push_row(
                &mut output,
                &[
                    entry.comparison.symbol().to_string(),
                    entry.version.to_string(),
                    join_apis(&entry.true_apis),
                    join_apis(&entry.false_apis),
                    entry.napps.to_string(),
                    last,
                ],
            );
        }
        output
    }
}
