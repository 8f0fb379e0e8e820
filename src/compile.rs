//! Main module for the coursegraph compilation pipeline
//!
//! The pipeline is a small compiler front-end over the authoring dialect:
//!
//!     1. Lexing. Each line is tokenized with a logos lexer and classified
//!        (header, field, single-colon candidate, list item, blank, text).
//!        See [lexing].
//!     2. Parsing. Classified lines are assembled into raw sections and
//!        segments per document, with local diagnostics. See [parsing].
//!     3. Field validation. Per-kind tables of required/optional/forbidden
//!        fields, with typo suggestions for near-miss names. See [fields].
//!     4. Resolution. slug↔path tables are built over the whole vault and
//!        wiki-references are resolved against them. See [resolving].
//!     5. Flattening. Module outlines are expanded into flat, ordered
//!        section lists; the learning-outcome/lens hierarchy exists only
//!        during this step. See [flattening].
//!     6. Tier checking. Course→module maturity cross-checks. See [tiers].
//!
//! The URL reachability validator ([linkcheck]) is the sole asynchronous,
//! network-bound component and runs after (and independently of) the
//! synchronous pipeline.

pub mod config;
pub mod diagnostics;
pub mod fields;
pub mod flattening;
pub mod frontmatter;
pub mod lexing;
pub mod linkcheck;
pub mod model;
pub mod parsing;
pub mod pipeline;
pub mod resolving;
pub mod slug;
pub mod tiers;
pub mod vault;

pub use diagnostics::{ContentError, Diagnostics, Severity};
pub use model::{Course, Module, ProgressionItem, Section, Segment};
pub use pipeline::{compile, CompiledVault};
