use std::sync::LazyLock;

use regex::Regex;

use super::lexer::split_arguments;
use crate::DoctagError;
use crate::DoctagResult;
use crate::canonical::KEY_PREFIX;

/// `key:method(args)`, where the key may be dotted (`doc.add`).
static METHOD_CALL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?s)^([\w.]+):(\w+)\((.*)\)$").expect("valid method call pattern")
});

/// A call such as `doc.add:get('param', 0)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
	/// The block key without the `doc.` prefix.
	pub key: String,
	/// The method name as written. Resolved when evaluated.
	pub method: String,
	/// Raw arguments, still quoted.
	pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionKind {
	/// `{{ @doc.key:method(...) }}`, replaced by its value.
	Method(MethodCall),
	/// `{{ @if doc.key:method(...) }}`, opens a conditional section.
	If(MethodCall),
	/// `{{ @end }}`, closes the nearest open conditional section.
	End,
}

/// A parsed expression and the byte span `[start, end)` it occupies in the
/// host text, braces included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DslExpression {
	pub kind: ExpressionKind,
	pub start: usize,
	pub end: usize,
}

/// Parse the body of an expression, the text between `@` and `}}`.
pub fn parse_expression(raw: &str) -> DoctagResult<ExpressionKind> {
	let body = raw.trim();

	if body == "end" {
		return Ok(ExpressionKind::End);
	}

	if let Some(guard) = body
		.strip_prefix("if")
		.filter(|rest| rest.starts_with(char::is_whitespace))
	{
		return parse_method_call(guard.trim()).map(ExpressionKind::If);
	}

	parse_method_call(body).map(ExpressionKind::Method)
}

/// Parse `key:method(args)`.
pub fn parse_method_call(body: &str) -> DoctagResult<MethodCall> {
	let Some(captures) = METHOD_CALL.captures(body) else {
		return Err(DoctagError::ExpressionSyntax {
			expression: body.to_string(),
			reason: "expected `key:method(args)`".to_string(),
		});
	};

	let key = &captures[1];
	let key = key.strip_prefix(KEY_PREFIX).unwrap_or(key);

	if key.is_empty() {
		return Err(DoctagError::ExpressionSyntax {
			expression: body.to_string(),
			reason: "the key is empty".to_string(),
		});
	}

	Ok(MethodCall {
		key: key.to_string(),
		method: captures[2].to_string(),
		args: split_arguments(&captures[3]),
	})
}
