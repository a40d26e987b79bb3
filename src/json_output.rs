//! JSON output for the mined ruleset (`--format json`)

use crate::probe::Operator;
use crate::ruleset::{Confidence, RulesetEntry};
use serde::Serialize;

/// A single reported rule
#[derive(Debug, Clone, Serialize)]
pub struct JsonRule {
    /// `<=` or `!=`
    pub comparison: Operator,
    pub version: i64,
    pub true_apis: Vec<String>,
    pub false_apis: Vec<String>,
    pub napps: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct JsonOutput {
    #[serde(skip)]
    detailed: bool,
    pub rules: Vec<JsonRule>,
}

impl JsonOutput {
    pub fn new(detailed: bool) -> Self {
        Self {
            detailed,
            rules: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: RulesetEntry) {
        let (keywords, support) = if self.detailed {
            (None, Some(entry.support.into_iter().collect()))
        } else {
            (Some(entry.keywords), None)
        };

        self.rules.push(JsonRule {
            comparison: entry.comparison,
            version: entry.version,
            true_apis: entry.true_apis.into_iter().collect(),
            false_apis: entry.false_apis.into_iter().collect(),
            napps: entry.napps,
            keywords,
            support,
        });
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ApiSet;

    fn entry() -> RulesetEntry {
        RulesetEntry {
            comparison: Operator::Ne,
            version: 23,
            true_apis: ["a.A()".to_string()].into_iter().collect(),
            false_apis: ApiSet::new(),
            napps: Confidence::Count(2),
            keywords: "fix".to_string(),
            support: ["app1".to_string(), "app2".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_json_rule_fields() {
        let mut output = JsonOutput::new(false);
        output.add_entry(entry());
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        let rule = &value["rules"][0];
        assert_eq!(rule["comparison"], "!=");
        assert_eq!(rule["version"], 23);
        assert_eq!(rule["true_apis"][0], "a.A()");
        assert_eq!(rule["false_apis"].as_array().unwrap().len(), 0);
        assert_eq!(rule["napps"], 2);
        assert_eq!(rule["keywords"], "fix");
        assert!(rule.get("support").is_none());
    }

    #[test]
    fn test_json_detailed_reports_support() {
        let mut output = JsonOutput::new(true);
        output.add_entry(entry());
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        let rule = &value["rules"][0];
        assert!(rule.get("keywords").is_none());
        assert_eq!(rule["support"][1], "app2");
    }

    #[test]
    fn test_weighted_napps_is_float() {
        let mut output = JsonOutput::new(false);
        let mut weighted = entry();
        weighted.napps = Confidence::Weighted(2.5);
        output.add_entry(weighted);
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(value["rules"][0]["napps"], 2.5);
    }
}
