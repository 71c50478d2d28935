//! The template language embedded in markdown.
//!
//! ```markdown
//! ## {{ @doc.add:meta('key') }}
//!
//! {{ @doc.add:get('description', 0) }}
//!
//! {{ @if doc.add:has('param') }}
//! {{ @doc.add:each('param', '- `{1}` ({0,1})') }}
//! {{ @end }}
//! ```
//!
//! [`find_expressions`] locates expressions, [`parse_expression`] reads one
//! body and [`evaluate_dsl`] renders a whole text against a
//! [`CanonicalDocument`](crate::CanonicalDocument).

pub use evaluator::*;
pub use lexer::find_expressions;
pub use lexer::split_arguments;
pub use parser::*;

mod evaluator;
mod lexer;
mod parser;
