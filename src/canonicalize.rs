//! Probe canonicalization: pairing complementary version checks of a method
//!
//! A method typically shows both branches of a version guard, e.g.
//! `SDK_INT < 21` around the legacy call and `SDK_INT >= 21` around the new
//! one. Each complementary pair collapses into one [`MatchedRule`] whose
//! operator is always `<=` or `!=`:
//!
//! ```text
//! (== T, != T)  ->  != T      true = apis(!=), false = apis(==)
//! (<= T,  > T)  ->  <= T      true = apis(<=), false = apis(>)
//! (<  T, >= T)  ->  <= T-1    true = apis(<),  false = apis(>=)
//! ```
//!
//! # Example
//!
//! ```
//! use guardminer::canonicalize::Method;
//! use guardminer::probe::{Operator, VersionCheck, VersionProbe};
//!
//! let mut method = Method::new("com.app.Main.onCreate()");
//! method.push(VersionProbe::new(VersionCheck::new(Operator::Lt, 5), ["a"], None, 1));
//!
//! let outcome = method.canonicalize("com.app");
//! assert_eq!(outcome.rules.len(), 1);
//! assert_eq!(outcome.rules[0].operator, Operator::Le);
//! assert_eq!(outcome.rules[0].threshold, 4);
//! ```

use crate::probe::{ApiSet, Operator, VersionProbe};
use serde::Serialize;

/// A method of one application version and the probes observed in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub signature: String,
    pub probes: Vec<VersionProbe>,
}

/// Canonical two-branch rule produced from a probe pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRule {
    /// Always [`Operator::Le`] or [`Operator::Ne`]
    pub operator: Operator,
    pub threshold: i64,
    pub true_apis: ApiSet,
    pub false_apis: ApiSet,
    pub message: Option<String>,
    pub changed_files: u32,
    pub source_app: String,
}

/// A method whose leftover probes admit no consistent pairing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconsistentMethod {
    pub app: String,
    pub signature: String,
    /// Indices (into the method's probe list) of the discarded probes
    pub discarded: Vec<usize>,
}

/// Result of canonicalizing one method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalOutcome {
    pub rules: Vec<MatchedRule>,
    /// Rules dropped because both branches call the same APIs
    pub degenerate: usize,
    pub inconsistent: Option<InconsistentMethod>,
}

/// Pairing of a method's probes by index
///
/// `unmatched` is sorted ascending; `pairs` holds `(i, j)` with `i < j`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbePairing {
    pub pairs: Vec<(usize, usize)>,
    pub unmatched: Vec<usize>,
}

impl Method {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            probes: Vec::new(),
        }
    }

    pub fn push(&mut self, probe: VersionProbe) {
        self.probes.push(probe);
    }

    /// First-fit matching of complementary probes
    ///
    /// Probes are visited in index order; each unpaired probe `i` takes the
    /// lowest-index unpaired `j > i` whose check is the exact inverse of its
    /// own. Any earlier candidate `j < i` would already have claimed `i` when
    /// it was visited, so scanning forward suffices.
    pub fn pair_probes(&self) -> ProbePairing {
        let n = self.probes.len();
        let mut paired = vec![false; n];
        let mut pairs = Vec::new();

        for i in 0..n {
            if paired[i] {
                continue;
            }
            let partner = (i + 1..n)
                .find(|&j| !paired[j] && self.probes[i].is_inverse_of(&self.probes[j]));
            if let Some(j) = partner {
                paired[i] = true;
                paired[j] = true;
                pairs.push((i, j));
            }
        }

        let unmatched = (0..n).filter(|&i| !paired[i]).collect();
        ProbePairing { pairs, unmatched }
    }

    /// Turn this method's probes into canonical rules
    ///
    /// An odd number of leftovers means some branches were never observed:
    /// each leftover is completed with an empty complementary probe. An even,
    /// non-zero number of leftovers has no consistent completion and the
    /// leftovers are dropped with a diagnostic.
    pub fn canonicalize(&self, app: &str) -> CanonicalOutcome {
        let pairing = self.pair_probes();
        let mut outcome = CanonicalOutcome::default();
        let mut candidates = Vec::with_capacity(pairing.pairs.len() + pairing.unmatched.len());

        for &(i, j) in &pairing.pairs {
            candidates.push(MatchedRule::from_pair(&self.probes[i], &self.probes[j], app));
        }

        if !pairing.unmatched.is_empty() {
            if pairing.unmatched.len() % 2 == 1 {
                for &i in &pairing.unmatched {
                    let probe = &self.probes[i];
                    candidates.push(MatchedRule::from_pair(probe, &probe.complement(), app));
                }
            } else {
                tracing::warn!(
                    "Inconsistent checks @ {}:{} ({} unmatched probes discarded)",
                    app,
                    self.signature,
                    pairing.unmatched.len()
                );
                outcome.inconsistent = Some(InconsistentMethod {
                    app: app.to_string(),
                    signature: self.signature.clone(),
                    discarded: pairing.unmatched.clone(),
                });
            }
        }

        for rule in candidates {
            if rule.is_degenerate() {
                outcome.degenerate += 1;
            } else {
                outcome.rules.push(rule);
            }
        }

        tracing::debug!(
            method = %self.signature,
            probes = self.probes.len(),
            rules = outcome.rules.len(),
            "canonicalized method"
        );

        outcome
    }
}

impl MatchedRule {
    /// Canonicalize a complementary pair
    ///
    /// `first` must be the lower-index probe; message and changed-file count
    /// come from it. Callers guarantee `first.is_inverse_of(second)`.
    pub fn from_pair(first: &VersionProbe, second: &VersionProbe, app: &str) -> Self {
        debug_assert!(first.is_inverse_of(second));

        let pick = |op: Operator| if first.check.operator == op { first } else { second };

        let (operator, threshold, truthy, falsy) = match first.check.operator {
            Operator::Eq | Operator::Ne => {
                let ne = pick(Operator::Ne);
                (Operator::Ne, ne.check.threshold, ne, pick(Operator::Eq))
            }
            Operator::Le | Operator::Gt => {
                let le = pick(Operator::Le);
                (Operator::Le, le.check.threshold, le, pick(Operator::Gt))
            }
            Operator::Lt | Operator::Ge => {
                let lt = pick(Operator::Lt);
                (Operator::Le, lt.check.threshold - 1, lt, pick(Operator::Ge))
            }
        };

        Self {
            operator,
            threshold,
            true_apis: truthy.apis.clone(),
            false_apis: falsy.apis.clone(),
            message: first.message.clone(),
            changed_files: first.changed_files,
            source_app: app.to_string(),
        }
    }

    /// Both branches call the same APIs (including both empty)
    pub fn is_degenerate(&self) -> bool {
        self.true_apis == self.false_apis
    }

    /// APIs called only when the check holds
    pub fn only_in_true(&self) -> ApiSet {
        self.true_apis.difference(&self.false_apis).cloned().collect()
    }

    /// APIs called only when the check fails
    pub fn only_in_false(&self) -> ApiSet {
        self.false_apis.difference(&self.true_apis).cloned().collect()
    }
}
