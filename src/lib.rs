//! Guardminer - API compatibility rules mined from SDK version checks
//!
//! This library turns the `SDK_INT` comparisons found in application
//! histories into canonical two-branch rules, aggregates them across the
//! corpus and reports the roots of each subsumption graph: the rules no
//! other rule is subsumed by.

pub mod aggregate;
pub mod canonicalize;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod csv_output;
pub mod denylist;
pub mod digraph;
pub mod error;
pub mod json_output;
pub mod pipeline;
pub mod probe;
pub mod reliability;
pub mod ruleset;
pub mod subsumption;
pub mod table;
