#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Scope-aware renaming of identifiers and property names across a
//! JavaScript/TypeScript project.
//!
//! A [`Project`] drives one build: each [`SourceUnit`] is analyzed into a
//! scope tree, new names are assigned against the project-wide tables, and
//! the syntax tree is rewritten in place. [`Project::finish`] returns the
//! [`NameCache`] that keeps the next incremental build stable.

pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod mangle;
pub mod project;
pub mod report;
pub mod reserved;
pub mod scope;
pub mod source;
pub mod tables;
pub mod whitelist;

pub use cache::{FileNameCache, NameCache};
pub use config::{GeneratorConfig, MangleConfig, NameGeneratorKind};
pub use error::{Error, Result};
pub use generator::{build_generator, NameGenerator};
pub use mangle::{mangle_unit, MangleContext, UnitOutcome, MAX_NAME_ATTEMPTS};
pub use project::{BuildOutput, Project};
pub use report::{BuildReport, Diagnostic, FileReport, KeptNamesReport, Severity, SkippedFile};
pub use scope::{analyze, ScopeTree};
pub use source::{parse_source, print, read_source, SourceUnit};
pub use tables::{GlobalMangledTable, HistoryTable};
pub use whitelist::{Partition, WhitelistBuilder, WhitelistRegistry};
