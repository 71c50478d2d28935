use logos::Logos;
use tracing::trace;

use super::parser::DslExpression;
use super::parser::parse_expression;

/// Tokens of the text inside a `{{ @ ... }}` candidate.
///
/// A quote that never closes matches no token and surfaces as a lexer error.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[token("}}")]
	ExpressionClose,
	#[token("}")]
	BraceClose,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token(",")]
	Comma,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r#"[^}(),"']+"#)]
	Text,
}

/// Find the next candidate opener at or after `from`: `{{`, optional
/// whitespace, then `@`. Returns the offset of `{{` and of the body after the
/// `@`.
fn next_candidate(text: &str, mut from: usize) -> Option<(usize, usize)> {
	while let Some(found) = text.get(from..)?.find("{{") {
		let open = from + found;
		let after = &text[open + 2..];
		let rest = after.trim_start();

		if rest.starts_with('@') {
			let body = open + 2 + (after.len() - rest.len()) + 1;
			return Some((open, body));
		}

		// `{{{ @` opens one brace later.
		from = open + 1;
	}

	None
}

/// Find the `}}` closing a candidate whose body starts at `body`. Returns the
/// offsets of the terminator's start and end.
fn find_terminator(text: &str, body: usize) -> Option<(usize, usize)> {
	let mut lexer = RawToken::lexer(&text[body..]);
	let mut depth: i32 = 0;

	while let Some(token) = lexer.next() {
		match token {
			Ok(RawToken::ParenOpen) => depth += 1,
			Ok(RawToken::ParenClose) => depth -= 1,
			Ok(RawToken::ExpressionClose) if depth == 0 => {
				let span = lexer.span();
				return Some((body + span.start, body + span.end));
			}
			Ok(_) => {}
			Err(()) => return None,
		}
	}

	None
}

/// Find every `{{ @... }}` expression in `text`, in source order.
///
/// `}}` inside quoted strings or parentheses does not end an expression. A
/// candidate that never terminates is dropped and the search continues after
/// its `{{`. Bodies that don't parse are dropped as well.
pub fn find_expressions(text: &str) -> Vec<DslExpression> {
	let mut expressions = Vec::new();
	let mut from = 0;

	while let Some((start, body)) = next_candidate(text, from) {
		let Some((close, end)) = find_terminator(text, body) else {
			trace!(offset = start, "unterminated expression candidate");
			from = start + 2;
			continue;
		};

		let raw = &text[body..close];
		match parse_expression(raw) {
			Ok(kind) => expressions.push(DslExpression { kind, start, end }),
			Err(error) => trace!(offset = start, %error, "dropping malformed expression"),
		}

		from = end;
	}

	expressions
}

/// Split an argument list on top-level commas. Commas inside quotes or
/// parentheses are kept. Every comma closes the current argument, so empty
/// arguments between commas are kept; a trailing empty argument is not.
pub fn split_arguments(input: &str) -> Vec<String> {
	let mut lexer = RawToken::lexer(input);
	let mut arguments = Vec::new();
	let mut current = String::new();
	let mut depth: i32 = 0;

	while let Some(token) = lexer.next() {
		match token {
			Ok(RawToken::Comma) if depth == 0 => {
				arguments.push(current.trim().to_string());
				current.clear();
				continue;
			}
			Ok(RawToken::ParenOpen) => depth += 1,
			Ok(RawToken::ParenClose) => depth -= 1,
			Ok(_) => {}
			Err(()) => {
				// An unterminated quote runs to the end of the input.
				current.push_str(&input[lexer.span().start..]);
				break;
			}
		}

		current.push_str(lexer.slice());
	}

	let last = current.trim();
	if !last.is_empty() {
		arguments.push(last.to_string());
	}

	arguments
}
