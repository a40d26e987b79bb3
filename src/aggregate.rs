//! Corpus-wide aggregation of canonical rules
//!
//! Rules are keyed by (operator, threshold, true APIs, false APIs). For every
//! key the aggregator counts occurrences, collects the distinct applications
//! supporting it and picks a representative commit message: the one from the
//! most focused commit, i.e. the one touching the fewest files.

use crate::canonicalize::MatchedRule;
use crate::probe::{ApiSet, Operator};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Separator between tied representative messages
pub const MESSAGE_SEPARATOR: &str = " ||| ";

/// Deduplication key of a canonical rule
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RuleKey {
    pub operator: Operator,
    pub threshold: i64,
    pub true_apis: ApiSet,
    pub false_apis: ApiSet,
}

impl RuleKey {
    pub fn of(rule: &MatchedRule) -> Self {
        Self {
            operator: rule.operator,
            threshold: rule.threshold,
            true_apis: rule.true_apis.clone(),
            false_apis: rule.false_apis.clone(),
        }
    }
}

/// A deduplicated rule with its corpus support
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedRule {
    pub operator: Operator,
    pub threshold: i64,
    pub true_apis: ApiSet,
    pub false_apis: ApiSet,
    /// Number of matched rules under this key, repeats within an app included
    pub occurrences: usize,
    pub supporting_apps: BTreeSet<String>,
    pub representative_message: String,
}

impl AggregatedRule {
    pub fn key(&self) -> RuleKey {
        RuleKey {
            operator: self.operator,
            threshold: self.threshold,
            true_apis: self.true_apis.clone(),
            false_apis: self.false_apis.clone(),
        }
    }

    pub fn support(&self) -> usize {
        self.supporting_apps.len()
    }
}

#[derive(Debug, Default)]
struct RuleTally {
    occurrences: usize,
    apps: BTreeSet<String>,
    /// (message, changed files), in arrival order
    messages: Vec<(String, u32)>,
}

/// Accumulates matched rules from every method of every application
#[derive(Debug, Default)]
pub struct RuleAggregator {
    tallies: BTreeMap<RuleKey, RuleTally>,
    rejected: usize,
}

impl RuleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one matched rule
    ///
    /// Degenerate rules (identical branches) are refused and counted.
    pub fn add(&mut self, rule: &MatchedRule) {
        if rule.is_degenerate() {
            self.rejected += 1;
            return;
        }

        let tally = self.tallies.entry(RuleKey::of(rule)).or_default();
        tally.occurrences += 1;
        tally.apps.insert(rule.source_app.clone());

        if let Some(message) = rule.message.as_deref() {
            if !message.is_empty() && rule.changed_files > 0 {
                tally.messages.push((message.to_string(), rule.changed_files));
            }
        }
    }

    pub fn extend<'a>(&mut self, rules: impl IntoIterator<Item = &'a MatchedRule>) {
        for rule in rules {
            self.add(rule);
        }
    }

    /// Number of distinct keys seen so far
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Degenerate rules refused by [`RuleAggregator::add`]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Materialize the aggregated rules in key order
    pub fn finish(self) -> Vec<AggregatedRule> {
        self.tallies
            .into_iter()
            .map(|(key, tally)| AggregatedRule {
                operator: key.operator,
                threshold: key.threshold,
                true_apis: key.true_apis,
                false_apis: key.false_apis,
                occurrences: tally.occurrences,
                supporting_apps: tally.apps,
                representative_message: representative_message(&tally.messages),
            })
            .collect()
    }
}

/// Pick the message(s) of the most focused commit
///
/// Each candidate scores `1 / changed_files`. Every distinct message reaching
/// the best score is kept, annotated with the candidate count and its score.
pub fn representative_message(candidates: &[(String, u32)]) -> String {
    let Some(fewest) = candidates
        .iter()
        .map(|(_, files)| *files)
        .filter(|files| *files > 0)
        .min()
    else {
        return String::new();
    };

    let total = candidates.iter().filter(|(_, files)| *files > 0).count();
    let score = 1.0 / f64::from(fewest);

    let mut seen = BTreeSet::new();
    candidates
        .iter()
        .filter(|(message, files)| *files == fewest && seen.insert(message.as_str()))
        .map(|(message, _)| format!("{} (among: {}, score: {:.4})", message, total, score))
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(app: &str, truthy: &[&str], falsy: &[&str], message: Option<&str>, files: u32) -> MatchedRule {
        MatchedRule {
            operator: Operator::Le,
            threshold: 20,
            true_apis: truthy.iter().map(|s| s.to_string()).collect(),
            false_apis: falsy.iter().map(|s| s.to_string()).collect(),
            message: message.map(str::to_string),
            changed_files: files,
            source_app: app.to_string(),
        }
    }

    #[test]
    fn test_same_rule_from_two_apps() {
        let mut agg = RuleAggregator::new();
        agg.add(&rule("app1", &["a"], &["b"], None, 1));
        agg.add(&rule("app2", &["a"], &["b"], None, 1));

        let rules = agg.finish();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].occurrences, 2);
        assert_eq!(rules[0].support(), 2);
    }

    #[test]
    fn test_repeats_within_app_count_occurrences_only() {
        let mut agg = RuleAggregator::new();
        for _ in 0..3 {
            agg.add(&rule("app1", &["a"], &[], None, 1));
        }
        let rules = agg.finish();
        assert_eq!(rules[0].occurrences, 3);
        assert_eq!(rules[0].support(), 1);
    }

    #[test]
    fn test_distinct_branches_are_distinct_keys() {
        let mut agg = RuleAggregator::new();
        agg.add(&rule("app1", &["a"], &["b"], None, 1));
        agg.add(&rule("app1", &["b"], &["a"], None, 1));
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_degenerate_rules_never_aggregate() {
        let mut agg = RuleAggregator::new();
        agg.add(&rule("app1", &["a"], &["a"], None, 1));
        agg.add(&rule("app1", &[], &[], None, 1));

        assert!(agg.is_empty());
        assert_eq!(agg.rejected(), 2);
        assert!(agg.finish().is_empty());
    }

    #[test]
    fn test_message_prefers_fewest_changed_files() {
        let mut agg = RuleAggregator::new();
        agg.add(&rule("app1", &["a"], &[], Some("big refactor"), 40));
        agg.add(&rule("app2", &["a"], &[], Some("Use new API on Lollipop"), 2));
        agg.add(&rule("app3", &["a"], &[], Some("another"), 5));

        let rules = agg.finish();
        assert_eq!(
            rules[0].representative_message,
            "Use new API on Lollipop (among: 3, score: 0.5000)"
        );
    }

    #[test]
    fn test_message_ties_are_all_kept() {
        let candidates = vec![
            ("first".to_string(), 1),
            ("second".to_string(), 1),
            ("first".to_string(), 1),
            ("noise".to_string(), 9),
        ];
        assert_eq!(
            representative_message(&candidates),
            "first (among: 4, score: 1.0000) ||| second (among: 4, score: 1.0000)"
        );
    }

    #[test]
    fn test_zero_file_and_empty_messages_are_ignored() {
        let mut agg = RuleAggregator::new();
        agg.add(&rule("app1", &["a"], &[], Some("no files"), 0));
        agg.add(&rule("app2", &["a"], &[], Some(""), 3));
        agg.add(&rule("app3", &["a"], &[], None, 3));

        let rules = agg.finish();
        assert_eq!(rules[0].representative_message, "");
        assert_eq!(rules[0].support(), 3);
    }

    #[test]
    fn test_occurrences_at_least_support() {
        let mut agg = RuleAggregator::new();
        for (i, app) in ["x", "y", "x", "z", "y"].iter().enumerate() {
            agg.add(&rule(app, &["a"], &[], None, i as u32));
        }
        for r in agg.finish() {
            assert!(r.occurrences >= r.support());
            assert!(r.support() >= 1);
        }
    }
}
