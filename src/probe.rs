//! Version probes: one observed `SDK_INT <op> <threshold>` comparison
//!
//! A probe carries the APIs called in the branch it guards, plus the commit
//! metadata (message, number of changed files) of the diff it was mined from.

use crate::error::{Result, RulesetError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Set of fully qualified API identifiers, kept sorted for deterministic joins
pub type ApiSet = BTreeSet<String>;

/// Comparison operator of a version check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    /// Logical negation of the comparison at the same threshold
    pub fn inverse(self) -> Self {
        match self {
            Operator::Lt => Operator::Ge,
            Operator::Ge => Operator::Lt,
            Operator::Le => Operator::Gt,
            Operator::Gt => Operator::Le,
            Operator::Eq => Operator::Ne,
            Operator::Ne => Operator::Eq,
        }
    }

    /// Operator symbol as written in source code
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }

    /// Short alphabetic name, safe for file names
    pub fn mnemonic(self) -> &'static str {
        match self {
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Eq => "eq",
            Operator::Ne => "ne",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = RulesetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            other => Err(RulesetError::InvalidCheck(other.to_string())),
        }
    }
}

/// A parsed `SDK_INT <op> <threshold>` comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionCheck {
    pub operator: Operator,
    pub threshold: i64,
}

impl VersionCheck {
    pub fn new(operator: Operator, threshold: i64) -> Self {
        Self {
            operator,
            threshold,
        }
    }

    /// The complementary check guarding the other branch
    pub fn inverse(self) -> Self {
        Self::new(self.operator.inverse(), self.threshold)
    }

    /// Parse a check such as `SDK_INT >= 21` or `Build.VERSION.SDK_INT<=19`
    ///
    /// The first `SDK_INT` occurrence must be followed by an operator and an
    /// integer literal; anything after the literal is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || RulesetError::InvalidCheck(text.to_string());

        let start = text.find("SDK_INT").ok_or_else(invalid)?;
        let rest = text[start + "SDK_INT".len()..].trim_start();

        let op_len = rest
            .char_indices()
            .take_while(|(i, c)| match i {
                0 => matches!(c, '<' | '>' | '!' | '='),
                1 => *c == '=',
                _ => false,
            })
            .count();
        let operator: Operator = rest[..op_len].parse().map_err(|_| invalid())?;

        let rest = rest[op_len..].trim_start();
        let digits_len = rest
            .char_indices()
            .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '-'))
            .count();
        let threshold = rest[..digits_len].parse::<i64>().map_err(|_| invalid())?;

        // `<` and `>=` canonicalize to `<= threshold - 1`
        if matches!(operator, Operator::Lt | Operator::Ge) && threshold.checked_sub(1).is_none() {
            return Err(invalid());
        }

        Ok(Self::new(operator, threshold))
    }
}

impl fmt::Display for VersionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SDK_INT {} {}", self.operator, self.threshold)
    }
}

/// One observed version comparison inside a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    pub check: VersionCheck,
    pub apis: ApiSet,
    pub message: Option<String>,
    pub changed_files: u32,
}

impl VersionProbe {
    pub fn new(
        check: VersionCheck,
        apis: impl IntoIterator<Item = impl Into<String>>,
        message: Option<String>,
        changed_files: u32,
    ) -> Self {
        Self {
            check,
            apis: apis.into_iter().map(Into::into).collect(),
            message,
            changed_files,
        }
    }

    /// The probe standing for an unobserved branch: inverse check, no code
    pub fn complement(&self) -> Self {
        Self {
            check: self.check.inverse(),
            apis: ApiSet::new(),
            message: None,
            changed_files: 0,
        }
    }

    /// Whether `other` guards the opposite branch of the same check
    pub fn is_inverse_of(&self, other: &VersionProbe) -> bool {
        self.check.inverse() == other.check
    }
}

/// Split an `&`-joined API list, ignoring empty segments
pub fn split_apis(joined: &str) -> ApiSet {
    joined
        .split('&')
        .map(str::trim)
        .filter(|api| !api.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join an API set with `&` in sorted order
pub fn join_apis(apis: &ApiSet) -> String {
    apis.iter().map(String::as_str).collect::<Vec<_>>().join("&")
}
