//! `doctag_core` is the engine behind [doctag](../doctag_cli). It reads
//! `@tag` annotations out of source comments in many languages, collects them
//! into a keyed canonical document and renders markdown templates against
//! that document.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source file
//!   -> Comment tokenizer (per-language delimiters -> CommentFragments)
//!   -> Tag extractor (`@name args` lines, multi-line block tags)
//!   -> Block assembler (init tag boundaries -> DocBlocks)
//!   -> Canonical indexer (`doc.<key>` -> DocBlock, unique keys)
//!
//! Markdown template + canonical document
//!   -> Expression scanner (`{{ @... }}` spans)
//!   -> Expression parser (method call, `if` guard or `end`)
//!   -> Evaluator (conditional sections, then substitution)
//! ```
//!
//! ## Modules
//!
//! - [`styles`]: comment syntax per extension and language.
//! - [`config`]: `doctag.json` / `doctag.toml` loading.
//! - [`project`]: workspace scanning and template rendering.
//! - [`dsl`]: the `{{ @doc.key:method(args) }}` template language.
//!
//! ## Annotating source
//!
//! ```rust,ignore
//! /// @doc add Add
//! /// @description Sums two numbers
//! /// @param a i32 First number
//! /// @param b i32 Second number
//! /// @returns i32 The sum
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doctag_core::project::scan_workspace_with_config;
//! use doctag_core::evaluate_dsl;
//! use std::path::Path;
//!
//! let (_, result) = scan_workspace_with_config(Path::new(".")).unwrap();
//! let rendered = evaluate_dsl(
//! 	"{{ @doc.add:get('description', 0) }}",
//! 	&result.document,
//! )
//! .unwrap();
//! println!("{rendered}");
//! ```

pub use assembler::*;
pub use canonical::*;
pub use comments::*;
pub use config::*;
pub use dsl::*;
pub use error::*;
pub use project::*;
pub use styles::*;
pub use tags::*;

mod assembler;
mod canonical;
mod comments;
pub mod config;
pub mod dsl;
#[allow(unused_assignments)]
mod error;
pub mod project;
pub mod styles;
mod tags;

#[cfg(test)]
mod __fixtures;
