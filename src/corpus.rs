//! Loading the probe corpus
//!
//! Every row of a probe table is one version check observed in one method of
//! one application version:
//!
//! ```text
//! id,app,version,sdk_min,sdk_trg,check,method,apis,apis_number,message,modified_files
//! 7,com.foo,1.2,14,28,SDK_INT >= 21,com.foo.Main.onCreate(),a.A()&b.B(),2,Use new API,3
//! ```
//!
//! A single file is read as a merged, comma-separated table. A directory is
//! merged on the fly from the tab-separated `*.csv` dumps it contains.

use crate::canonicalize::Method;
use crate::error::{Result, RulesetError};
use crate::probe::{split_apis, VersionCheck, VersionProbe};
use crate::table::{field, Dialect, Table};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One version of one application, with the methods holding probes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppVersion {
    pub app: String,
    pub version: String,
    pub sdk_min: String,
    pub methods: Vec<Method>,
}

/// All probes of a run, grouped app → version → method in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub apps: Vec<AppVersion>,
    /// Rows dropped because their version check could not be parsed
    pub skipped_rows: usize,
}

impl Corpus {
    pub fn method_count(&self) -> usize {
        self.apps.iter().map(|a| a.methods.len()).sum()
    }

    pub fn probe_count(&self) -> usize {
        self.apps
            .iter()
            .flat_map(|a| &a.methods)
            .map(|m| m.probes.len())
            .sum()
    }

    pub fn probes_mut(&mut self) -> impl Iterator<Item = &mut VersionProbe> {
        self.apps
            .iter_mut()
            .flat_map(|a| a.methods.iter_mut())
            .flat_map(|m| m.probes.iter_mut())
    }
}

/// Incrementally groups probe rows
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    corpus: Corpus,
    app_index: HashMap<(String, String), usize>,
    method_index: HashMap<(usize, String), usize>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_probe(
        &mut self,
        app: &str,
        version: &str,
        sdk_min: &str,
        method: &str,
        probe: VersionProbe,
    ) {
        let apps = &mut self.corpus.apps;
        let a = *self
            .app_index
            .entry((app.to_string(), version.to_string()))
            .or_insert_with(|| {
                apps.push(AppVersion {
                    app: app.to_string(),
                    version: version.to_string(),
                    sdk_min: sdk_min.to_string(),
                    methods: Vec::new(),
                });
                apps.len() - 1
            });

        let methods = &mut self.corpus.apps[a].methods;
        let m = *self
            .method_index
            .entry((a, method.to_string()))
            .or_insert_with(|| {
                methods.push(Method::new(method));
                methods.len() - 1
            });

        methods[m].push(probe);
    }

    pub fn skip_row(&mut self) {
        self.corpus.skipped_rows += 1;
    }

    /// Add every row of a probe table
    pub fn add_table(&mut self, table: &Table) -> Result<()> {
        let app = table.column("app")?;
        let version = table.column("version")?;
        let check = table.column("check")?;
        let method = table.column("method")?;
        let apis = table.column("apis")?;
        let sdk_min = table.optional_column("sdk_min");
        let message = table.optional_column("message");
        let modified = table.optional_column("modified_files");

        for (i, row) in table.rows.iter().enumerate() {
            let parsed = match VersionCheck::parse(field(row, check)) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Skipping row {} of {}: {}", i + 2, table.path.display(), e);
                    self.skip_row();
                    continue;
                }
            };

            let text = message.map(|c| field(row, c)).unwrap_or("");
            let probe = VersionProbe {
                check: parsed,
                apis: split_apis(field(row, apis)),
                message: (!text.is_empty()).then(|| text.to_string()),
                changed_files: modified
                    .map(|c| parse_file_count(field(row, c)))
                    .unwrap_or(0),
            };

            self.add_probe(
                field(row, app),
                field(row, version),
                sdk_min.map(|c| field(row, c)).unwrap_or(""),
                field(row, method),
                probe,
            );
        }
        Ok(())
    }

    pub fn finish(self) -> Corpus {
        self.corpus
    }
}

/// Changed-file counts are sometimes written as floats; garbage reads as 0
fn parse_file_count(text: &str) -> u32 {
    let text = text.trim();
    text.parse::<u32>()
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u32)
        })
        .unwrap_or(0)
}

/// Load a merged table, or merge every `*.csv` dump of a directory
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let mut builder = CorpusBuilder::new();

    if path.is_dir() {
        for file in table_files(path, |name| name.ends_with(".csv"))? {
            tracing::info!("Scanning {}", file.display());
            builder.add_table(&Table::read(&file, Dialect::Tab)?)?;
        }
    } else if path.is_file() {
        builder.add_table(&Table::read(path, Dialect::Comma)?)?;
    } else {
        return Err(RulesetError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input does not exist: {}", path.display()),
        )));
    }

    let corpus = builder.finish();
    tracing::info!(
        "Loaded {} probes in {} methods of {} app versions ({} rows skipped)",
        corpus.probe_count(),
        corpus.method_count(),
        corpus.apps.len(),
        corpus.skipped_rows
    );
    Ok(corpus)
}

/// Files of `dir` whose name passes `accept`, sorted by name
pub fn table_files(dir: &Path, accept: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let accepted = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(&accept)
            .unwrap_or(false);
        if accepted && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
