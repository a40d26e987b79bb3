//! API denylist applied before canonicalization
//!
//! Some APIs appear under version guards for reasons unrelated to platform
//! evolution (logging, framework helpers, obfuscated names). Patterns are
//! regular expressions matched against each fully qualified API; a matching
//! API is removed from every probe.
//!
//! A denylist file holds one pattern per line; blank lines and lines starting
//! with `#` are ignored.

use crate::corpus::Corpus;
use crate::error::{Result, RulesetError};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Compiled set of API patterns
#[derive(Debug, Clone, Default)]
pub struct ApiDenylist {
    patterns: Vec<Regex>,
}

/// What [`ApiDenylist::apply`] removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenylistReport {
    /// Removal count per API
    pub removed: BTreeMap<String, usize>,
    /// Number of probes that lost at least one API
    pub affected_probes: usize,
}

impl DenylistReport {
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }
}

impl ApiDenylist {
    /// A denylist that keeps everything
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }
            let regex = Regex::new(pattern).map_err(|e| {
                RulesetError::Config(format!("invalid denylist pattern '{}': {}", pattern, e))
            })?;
            compiled.push(regex);
        }
        Ok(Self { patterns: compiled })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let lines: Vec<&str> = text.lines().collect();
        Self::from_patterns(lines.as_slice())
    }

    /// Merge the patterns of `other` into this denylist
    pub fn extend(&mut self, other: ApiDenylist) {
        self.patterns.extend(other.patterns);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_denied(&self, api: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(api))
    }

    /// Strip denied APIs from every probe of the corpus
    pub fn apply(&self, corpus: &mut Corpus) -> DenylistReport {
        let mut report = DenylistReport::default();
        if self.is_empty() {
            return report;
        }

        for probe in corpus.probes_mut() {
            let before = probe.apis.len();
            probe.apis.retain(|api| {
                let denied = self.is_denied(api);
                if denied {
                    *report.removed.entry(api.clone()).or_insert(0) += 1;
                }
                !denied
            });
            if probe.apis.len() != before {
                report.affected_probes += 1;
            }
        }

        for (api, count) in &report.removed {
            tracing::debug!(api = %api, count, "denied API removed");
        }
        tracing::info!(
            "Denylist removed {} API occurrences ({} distinct) from {} probes",
            report.total_removed(),
            report.removed.len(),
            report.affected_probes
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusBuilder;
    use crate::probe::{Operator, VersionCheck, VersionProbe};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn corpus() -> Corpus {
        let mut builder = CorpusBuilder::new();
        let check = VersionCheck::new(Operator::Ge, 21);
        builder.add_probe(
            "com.a",
            "1",
            "14",
            "M.f()",
            VersionProbe::new(check, ["android.util.Log.d()", "a.A()"], None, 1),
        );
        builder.add_probe(
            "com.a",
            "1",
            "14",
            "M.f()",
            VersionProbe::new(check.inverse(), ["b.B()"], None, 1),
        );
        builder.add_probe(
            "com.b",
            "1",
            "14",
            "M.g()",
            VersionProbe::new(check, ["android.util.Log.e()"], None, 1),
        );
        builder.finish()
    }

    #[test]
    fn test_apply_removes_matching_apis() {
        let denylist = ApiDenylist::from_patterns(&[r"^android\.util\.Log\."]).unwrap();
        let mut corpus = corpus();
        let report = denylist.apply(&mut corpus);

        assert_eq!(report.affected_probes, 2);
        assert_eq!(report.total_removed(), 2);
        assert_eq!(report.removed.get("android.util.Log.d()"), Some(&1));

        let first = &corpus.apps[0].methods[0].probes[0];
        assert_eq!(first.apis.iter().collect::<Vec<_>>(), vec!["a.A()"]);
        assert!(corpus.apps[1].methods[0].probes[0].apis.is_empty());
    }

    #[test]
    fn test_empty_denylist_is_noop() {
        let mut corpus = corpus();
        let untouched = corpus.clone();
        let report = ApiDenylist::empty().apply(&mut corpus);
        assert_eq!(report, DenylistReport::default());
        assert_eq!(corpus, untouched);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ApiDenylist::from_patterns(&["(unclosed"]).unwrap_err();
        assert!(matches!(err, RulesetError::Config(_)));
    }

    #[test]
    fn test_from_file_skips_blank_and_comment_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# logging").unwrap();
        writeln!(file, "Log\\.").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "^java\\.lang\\.").unwrap();

        let denylist = ApiDenylist::from_file(file.path()).unwrap();
        assert_eq!(denylist.len(), 2);
        assert!(denylist.is_denied("android.util.Log.i()"));
        assert!(denylist.is_denied("java.lang.Thread.sleep()"));
        assert!(!denylist.is_denied("android.app.Activity.finish()"));
    }

    #[test]
    fn test_extend() {
        let mut a = ApiDenylist::from_patterns(&["x"]).unwrap();
        a.extend(ApiDenylist::from_patterns(&["y"]).unwrap());
        assert_eq!(a.len(), 2);
        assert!(a.is_denied("y.Y()"));
    }
}
