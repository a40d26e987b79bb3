//! Subsumption graphs over aggregated rules
//!
//! Rules sharing an (operator, threshold) bucket are compared pairwise. Rule
//! A is subsumed by rule B when B's branches call everything A's branches
//! call and B is backed by more applications. Each bucket becomes a
//! [`SubsumptionGraph`] with an edge A → B for every such relation.
//!
//! # Reporting
//!
//! Only roots (vertices with no incoming edge) are reported. A root's
//! confidence is the number of distinct applications backing it or any rule
//! it is *directly* subsumed by:
//!
//! ```text
//!   confidence(R) = | apps(R) ∪ ⋃ { apps(S) : R → S } |
//! ```
//!
//! Only one hop is followed, never the transitive closure.
//!
//! # Example
//!
//! ```
//! use guardminer::aggregate::AggregatedRule;
//! use guardminer::probe::Operator;
//! use guardminer::subsumption::{build_buckets, GraphOptions};
//!
//! fn rule(apis: &[&str], apps: &[&str]) -> AggregatedRule {
//!     AggregatedRule {
//!         operator: Operator::Le,
//!         threshold: 5,
//!         true_apis: apis.iter().map(|s| s.to_string()).collect(),
//!         false_apis: Default::default(),
//!         occurrences: apps.len(),
//!         supporting_apps: apps.iter().map(|s| s.to_string()).collect(),
//!         representative_message: String::new(),
//!     }
//! }
//!
//! let mut buckets = build_buckets(
//!     vec![rule(&["a"], &["app1"]), rule(&["a", "b"], &["app1", "app2"])],
//!     GraphOptions::default(),
//! );
//! let reports = buckets[0].root_reports();
//! assert_eq!(reports.len(), 1);
//! assert_eq!(reports[0].confidence, 2);
//! ```

mod export;

pub use export::{export_buckets, ExportSummary};

use crate::aggregate::AggregatedRule;
use crate::digraph::{DiGraph, NodeIndex};
use crate::probe::{ApiSet, Operator};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Default cap on DOT label length, in characters
pub const DEFAULT_LABEL_LIMIT: usize = 16383;

/// Knobs of graph construction and export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    /// Require strictly larger support on the subsuming side.
    ///
    /// When off, equal support is admitted too, but a subsumer backed by
    /// fewer apps still never links. The support comparison is relaxed,
    /// not dropped.
    pub strict_support: bool,
    pub label_limit: usize,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            strict_support: true,
            label_limit: DEFAULT_LABEL_LIMIT,
        }
    }
}

/// The (operator, threshold) pair shared by all rules of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub operator: Operator,
    pub threshold: i64,
}

impl BucketKey {
    pub fn of(rule: &AggregatedRule) -> Self {
        Self {
            operator: rule.operator,
            threshold: rule.threshold,
        }
    }

    /// File-name friendly form, e.g. `le_5` or `ne_23`
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.operator.mnemonic(), self.threshold)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.threshold)
    }
}

/// An aggregated rule placed in a subsumption graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    pub rule: AggregatedRule,
}

impl RuleNode {
    pub fn new(rule: AggregatedRule) -> Self {
        Self { rule }
    }

    pub fn apps(&self) -> &BTreeSet<String> {
        &self.rule.supporting_apps
    }

    /// Whether `self ⊑ other`
    ///
    /// Both API sets must be contained in `other`'s, an empty set only
    /// counts as contained in another empty set, and `other` must have
    /// strictly more supporting apps (at least as many when
    /// `strict_support` is off).
    pub fn is_subsumed_by(&self, other: &RuleNode, strict_support: bool) -> bool {
        let (a, b) = (&self.rule, &other.rule);
        if a.operator != b.operator || a.threshold != b.threshold {
            return false;
        }
        if !branch_contained(&a.true_apis, &b.true_apis)
            || !branch_contained(&a.false_apis, &b.false_apis)
        {
            return false;
        }
        if a.true_apis == b.true_apis && a.false_apis == b.false_apis {
            return false;
        }

        if strict_support {
            a.supporting_apps.len() < b.supporting_apps.len()
        } else {
            a.supporting_apps.len() <= b.supporting_apps.len()
        }
    }

    /// DOT label: support count, true APIs, a `~~~` separator, false APIs
    pub fn label(&self, limit: usize) -> String {
        let join = |apis: &ApiSet| apis.iter().map(String::as_str).collect::<Vec<_>>().join("\\n");
        let text = format!(
            "{}\\n{}\\n\\n~~~\\n\\n{}",
            self.rule.supporting_apps.len(),
            join(&self.rule.true_apis),
            join(&self.rule.false_apis)
        );

        if text.chars().count() > limit {
            let mut cut: String = text.chars().take(limit.saturating_sub(3)).collect();
            cut.push_str("...");
            cut
        } else {
            text
        }
    }
}

fn branch_contained(small: &ApiSet, large: &ApiSet) -> bool {
    if small.is_empty() {
        large.is_empty()
    } else {
        small.is_subset(large)
    }
}

/// A root rule with its one-hop support
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootReport {
    pub node: NodeIndex,
    pub rule: AggregatedRule,
    pub confidence: usize,
    pub support: BTreeSet<String>,
}

/// Subsumption graph of one (operator, threshold) bucket
#[derive(Debug, Clone)]
pub struct SubsumptionGraph {
    key: BucketKey,
    options: GraphOptions,
    graph: DiGraph<RuleNode>,
    confidences: HashMap<NodeIndex, usize>,
}

impl SubsumptionGraph {
    pub fn new(key: BucketKey, options: GraphOptions) -> Self {
        Self {
            key,
            options,
            graph: DiGraph::new(),
            confidences: HashMap::new(),
        }
    }

    pub fn key(&self) -> BucketKey {
        self.key
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    /// Add a rule and link it to every comparable rule already present
    ///
    /// Rules from another bucket are accepted but never linked.
    pub fn insert(&mut self, rule: AggregatedRule) -> NodeIndex {
        let node = RuleNode::new(rule);
        let strict = self.options.strict_support;

        let mut subsumes = Vec::new();
        let mut subsumed_by = Vec::new();
        for (other, existing) in self.graph.vertices() {
            if node.is_subsumed_by(existing, strict) {
                subsumed_by.push(other);
            }
            if existing.is_subsumed_by(&node, strict) {
                subsumes.push(other);
            }
        }

        let index = self.graph.add_vertex(node);
        for other in subsumed_by {
            self.graph.add_edge(index, other);
        }
        for other in subsumes {
            self.graph.add_edge(other, index);
        }

        self.confidences.clear();
        index
    }

    pub fn node(&self, v: NodeIndex) -> Option<&RuleNode> {
        self.graph.vertex(v)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Rules that `v` is directly subsumed by
    pub fn subsumers(&self, v: NodeIndex) -> Vec<NodeIndex> {
        self.graph.successors(v).collect()
    }

    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph.roots()
    }

    pub fn graph(&self) -> &DiGraph<RuleNode> {
        &self.graph
    }

    /// Own apps plus the apps of every direct subsumer
    pub fn support_apps(&self, v: NodeIndex) -> BTreeSet<String> {
        let mut apps: BTreeSet<String> = self
            .node(v)
            .map(|node| node.apps().clone())
            .unwrap_or_default();
        for target in self.graph.successors(v) {
            if let Some(node) = self.node(target) {
                apps.extend(node.apps().iter().cloned());
            }
        }
        apps
    }

    /// Size of [`SubsumptionGraph::support_apps`], cached until the next insert
    pub fn confidence(&mut self, v: NodeIndex) -> usize {
        if let Some(&cached) = self.confidences.get(&v) {
            return cached;
        }
        let value = self.support_apps(v).len();
        self.confidences.insert(v, value);
        value
    }

    /// Every root with its confidence, in insertion order
    pub fn root_reports(&mut self) -> Vec<RootReport> {
        let roots = self.roots();
        let mut reports = Vec::with_capacity(roots.len());
        for v in roots {
            let confidence = self.confidence(v);
            let support = self.support_apps(v);
            if let Some(node) = self.node(v) {
                reports.push(RootReport {
                    node: v,
                    rule: node.rule.clone(),
                    confidence,
                    support,
                });
            }
        }
        reports
    }

    /// Vertex with the most outgoing edges, first inserted on ties
    pub fn densest_vertex(&self) -> Option<NodeIndex> {
        let mut best: Option<(NodeIndex, usize)> = None;
        for (v, _) in self.graph.vertices() {
            let degree = self.graph.out_degree(v);
            if degree > best.map(|(_, d)| d).unwrap_or(0) {
                best = Some((v, degree));
            }
        }
        best.map(|(v, _)| v)
    }

    /// The densest vertex and its direct subsumers, as a fresh graph
    ///
    /// Relations are recomputed among the extracted rules. `None` when the
    /// bucket has no edges at all.
    pub fn densest_subtree(&self) -> Option<SubsumptionGraph> {
        let center = self.densest_vertex()?;
        let mut subtree = SubsumptionGraph::new(self.key, self.options);

        let members = std::iter::once(center).chain(self.graph.successors(center));
        for v in members {
            if let Some(node) = self.node(v) {
                subtree.insert(node.rule.clone());
            }
        }
        Some(subtree)
    }

    pub fn to_dot(&self) -> String {
        let limit = self.options.label_limit;
        self.graph.to_dot(|node| node.label(limit))
    }
}

/// Group rules into one subsumption graph per (operator, threshold)
///
/// Buckets come out sorted by key; rules keep their input order inside a
/// bucket.
pub fn build_buckets(
    rules: impl IntoIterator<Item = AggregatedRule>,
    options: GraphOptions,
) -> Vec<SubsumptionGraph> {
    let mut buckets: BTreeMap<BucketKey, SubsumptionGraph> = BTreeMap::new();
    for rule in rules {
        let key = BucketKey::of(&rule);
        buckets
            .entry(key)
            .or_insert_with(|| SubsumptionGraph::new(key, options))
            .insert(rule);
    }

    for graph in buckets.values() {
        tracing::debug!(
            bucket = %graph.key(),
            rules = graph.node_count(),
            edges = graph.edge_count(),
            "built subsumption graph"
        );
    }

    buckets.into_values().collect()
}
