//! Reliability weighting of reported rules
//!
//! A rule guarding rarely used APIs is backed by few applications simply
//! because few applications could exhibit it. Given how many applications use
//! each API at all, confidences are boosted for rules over rare APIs:
//!
//! ```text
//! nboth    = max(min(ntrue, nfalse), 1)
//! weighted = c * (1 + k * (1 - nboth / total))
//! ```
//!
//! where `ntrue` (`nfalse`) is the smallest per-API app count over the true
//! (false) branch, `total` the number of distinct applications in the usage
//! table and `k` the configured weight.
//!
//! The usage table is either a merged comma-separated file
//! (`api,occurrences,apps` with `&`-joined apps) or a directory of
//! tab-separated `APIs_*.csv` dumps (`app,api,occurrences`).

use crate::corpus::table_files;
use crate::error::Result;
use crate::probe::ApiSet;
use crate::table::{field, Dialect, Table};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Usage of one API across the scanned applications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiUsageEntry {
    pub occurrences: u64,
    pub apps: BTreeSet<String>,
}

/// Per-API usage across a population of applications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiUsage {
    entries: BTreeMap<String, ApiUsageEntry>,
    /// Every app seen under any API
    apps: BTreeSet<String>,
}

impl ApiUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `occurrences` uses of `api` in `app`
    pub fn record(&mut self, api: &str, app: &str, occurrences: u64) {
        self.record_many(api, [app], occurrences);
    }

    fn record_many<'a>(
        &mut self,
        api: &str,
        apps: impl IntoIterator<Item = &'a str>,
        occurrences: u64,
    ) {
        let entry = self.entries.entry(api.to_string()).or_default();
        entry.occurrences += occurrences;
        for app in apps.into_iter().map(str::trim).filter(|a| !a.is_empty()) {
            if !entry.apps.contains(app) {
                entry.apps.insert(app.to_string());
            }
            if !self.apps.contains(app) {
                self.apps.insert(app.to_string());
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut usage = Self::new();

        if path.is_dir() {
            let files = table_files(path, |name| {
                name.starts_with("APIs_") && name.ends_with(".csv")
            })?;
            for file in files {
                usage.add_project_dump(&Table::read(&file, Dialect::Tab)?)?;
            }
        } else {
            usage.add_merged_table(&Table::read(path, Dialect::Comma)?)?;
        }

        tracing::info!(
            "Loaded usage of {} APIs across {} apps from {}",
            usage.entries.len(),
            usage.apps.len(),
            path.display()
        );
        Ok(usage)
    }

    fn add_merged_table(&mut self, table: &Table) -> Result<()> {
        let api = table.column("api")?;
        let occurrences = table.optional_column("occurrences");
        let apps = table.column("apps")?;

        for row in &table.rows {
            let count = occurrences
                .map(|c| parse_count(field(row, c)))
                .unwrap_or(0);
            self.record_many(field(row, api), field(row, apps).split('&'), count);
        }
        Ok(())
    }

    fn add_project_dump(&mut self, table: &Table) -> Result<()> {
        let app = table.column("app")?;
        let api = table.column("api")?;
        let occurrences = table.optional_column("occurrences");

        for row in &table.rows {
            let count = occurrences
                .map(|c| parse_count(field(row, c)))
                .unwrap_or(0);
            self.record_many(field(row, api), [field(row, app)], count);
        }
        Ok(())
    }

    pub fn entry(&self, api: &str) -> Option<&ApiUsageEntry> {
        self.entries.get(api)
    }

    /// Number of apps using `api`, 0 when unknown
    pub fn app_count(&self, api: &str) -> usize {
        self.entries.get(api).map(|e| e.apps.len()).unwrap_or(0)
    }

    pub fn api_count(&self) -> usize {
        self.entries.len()
    }

    /// Distinct applications across the whole table
    pub fn total_apps(&self) -> usize {
        self.apps.len()
    }

    /// Smallest app count over `apis`; 0 for an empty set
    pub fn rarest(&self, apis: &ApiSet) -> usize {
        apis.iter().map(|api| self.app_count(api)).min().unwrap_or(0)
    }

    /// Confidence `c` of a rule with the given branches, boosted by rarity
    pub fn weight(&self, confidence: usize, true_apis: &ApiSet, false_apis: &ApiSet, k: f64) -> f64 {
        let c = confidence as f64;
        if self.apps.is_empty() {
            return c;
        }

        let ntrue = self.rarest(true_apis);
        let nfalse = self.rarest(false_apis);
        let nboth = ntrue.min(nfalse).max(1) as f64;
        c * (1.0 + k * (1.0 - nboth / self.apps.len() as f64))
    }
}

fn parse_count(text: &str) -> u64 {
    text.trim().parse().unwrap_or(0)
}
