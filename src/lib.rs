//! # coursegraph
//!
//! A compiler for wiki-style authored curriculum vaults.
//!
//! A vault is a directory tree of hand-authored text documents: course
//! outlines, lesson modules, learning-outcome definitions, and "lens"
//! documents bundling a video or article source with teaching segments.
//! coursegraph tokenizes the header/field dialect those documents are written
//! in, resolves cross-file wiki-references, flattens the module → learning
//! outcome → lens hierarchy into ordered section lists, and runs structural
//! validations, emitting one JSON document plus a diagnostics list.
//!
//! The library never aborts on malformed content. Every author-facing
//! problem becomes a [`ContentError`](compile::diagnostics::ContentError) in
//! the output; Rust-level errors are reserved for unreadable input.

pub mod compile;
