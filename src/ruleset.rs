//! Reported rules: the roots of every bucket with their confidence

use crate::probe::{ApiSet, Operator};
use crate::reliability::ApiUsage;
use crate::subsumption::{RootReport, SubsumptionGraph};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Confidence of a reported rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Confidence {
    /// Distinct supporting applications, one hop deep
    Count(usize),
    /// Count boosted by API rarity
    Weighted(f64),
}

impl Confidence {
    pub fn value(self) -> f64 {
        match self {
            Confidence::Count(n) => n as f64,
            Confidence::Weighted(w) => w,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Count(n) => write!(f, "{}", n),
            Confidence::Weighted(w) => write!(f, "{}", w),
        }
    }
}

/// One line of the mined ruleset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RulesetEntry {
    pub comparison: Operator,
    pub version: i64,
    pub true_apis: ApiSet,
    pub false_apis: ApiSet,
    pub napps: Confidence,
    pub keywords: String,
    pub support: BTreeSet<String>,
}

impl RulesetEntry {
    pub fn from_report(report: RootReport, usage: Option<(&ApiUsage, f64)>) -> Self {
        let RootReport {
            rule,
            confidence,
            support,
            ..
        } = report;

        let napps = match usage {
            Some((usage, k)) => Confidence::Weighted(usage.weight(
                confidence,
                &rule.true_apis,
                &rule.false_apis,
                k,
            )),
            None => Confidence::Count(confidence),
        };

        Self {
            comparison: rule.operator,
            version: rule.threshold,
            true_apis: rule.true_apis,
            false_apis: rule.false_apis,
            napps,
            keywords: rule.representative_message,
            support,
        }
    }
}

/// Collect the root reports of every bucket, in bucket order
pub fn collect_ruleset(
    buckets: &mut [SubsumptionGraph],
    usage: Option<(&ApiUsage, f64)>,
) -> Vec<RulesetEntry> {
    let mut entries = Vec::new();
    for graph in buckets.iter_mut() {
        let reports = graph.root_reports();
        tracing::debug!(bucket = %graph.key(), roots = reports.len(), "collected roots");
        entries.extend(
            reports
                .into_iter()
                .map(|report| RulesetEntry::from_report(report, usage)),
        );
    }
    entries
}
