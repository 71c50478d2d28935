use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;
use snailquote::unescape;
use tracing::debug;
use tracing::warn;

use super::lexer::find_expressions;
use super::parser::DslExpression;
use super::parser::ExpressionKind;
use super::parser::MethodCall;
use crate::DoctagError;
use crate::DoctagResult;
use crate::assembler::DocBlock;
use crate::canonical::CanonicalDocument;

/// `{0,1}` style placeholders in an `each` template.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\{\s*(\d+(?:\s*,\s*\d+)*)\s*\}").expect("valid placeholder pattern")
});

/// The methods available in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	/// `get(tag, index, ...mask)`: one field of one occurrence.
	Get,
	/// `count(tag)`: the number of occurrences.
	Count,
	/// `has(tag)`: `true` or `false`.
	Has,
	/// `meta(field)`: a metadata field.
	Meta,
	/// `each(tag, template)`: the template rendered per occurrence.
	Each,
}

impl FromStr for Method {
	type Err = DoctagError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		match name {
			"get" => Ok(Self::Get),
			"count" => Ok(Self::Count),
			"has" => Ok(Self::Has),
			"meta" => Ok(Self::Meta),
			"each" => Ok(Self::Each),
			_ => Err(DoctagError::UnknownMethod(name.to_string())),
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Get => "get",
			Self::Count => "count",
			Self::Has => "has",
			Self::Meta => "meta",
			Self::Each => "each",
		};

		f.write_str(name)
	}
}

/// Strip the quotes from a quoted argument. Double-quoted arguments support
/// the usual escapes (`\n`, `\t`, `\u{..}`). Single-quoted arguments only
/// resolve backslash-escaped characters. Bare arguments are returned
/// unchanged.
pub fn unquote(arg: &str) -> String {
	if arg.len() < 2 {
		return arg.to_string();
	}

	if arg.starts_with('"') && arg.ends_with('"') {
		return unescape(arg).unwrap_or_else(|_| arg[1..arg.len() - 1].to_string());
	}

	if arg.starts_with('\'') && arg.ends_with('\'') {
		let inner = &arg[1..arg.len() - 1];
		let mut value = String::with_capacity(inner.len());
		let mut chars = inner.chars();
		while let Some(c) = chars.next() {
			match c {
				'\\' => value.extend(chars.next()),
				_ => value.push(c),
			}
		}
		return value;
	}

	arg.to_string()
}

/// A method call with its arguments unquoted, bound to the block it targets.
struct Invocation<'a> {
	method: Method,
	key: &'a str,
	block: &'a DocBlock,
	args: Vec<String>,
}

impl Invocation<'_> {
	fn arg(&self, position: usize) -> DoctagResult<&str> {
		self.args
			.get(position)
			.map(String::as_str)
			.ok_or_else(|| self.invalid(position, "missing argument"))
	}

	fn invalid(&self, position: usize, reason: &str) -> DoctagError {
		DoctagError::InvalidArgument {
			method: self.method.to_string(),
			position,
			reason: reason.to_string(),
		}
	}

	fn index(&self, position: usize) -> DoctagResult<usize> {
		match self.args.get(position) {
			None => Ok(0),
			Some(value) => {
				value
					.trim()
					.parse()
					.map_err(|_| self.invalid(position, "expected a non-negative integer"))
			}
		}
	}

	fn mask(&self, from: usize) -> DoctagResult<Vec<bool>> {
		self.args
			.iter()
			.enumerate()
			.skip(from)
			.map(|(position, bit)| {
				match bit.trim() {
					"1" => Ok(true),
					"0" => Ok(false),
					_ => Err(self.invalid(position, "mask bits must be 0 or 1")),
				}
			})
			.collect()
	}

	fn occurrences(&self, tag: &str) -> DoctagResult<&[Vec<String>]> {
		self.block
			.occurrences(tag)
			.ok_or_else(|| {
				DoctagError::UnknownTag {
					key: self.key.to_string(),
					tag: tag.to_string(),
				}
			})
	}

	fn run(&self) -> DoctagResult<String> {
		match self.method {
			Method::Get => {
				let tag = self.arg(0)?;
				let index = self.index(1)?;
				let mask = self.mask(2)?;
				let occurrences = self.occurrences(tag)?;
				let fields = occurrences.get(index).ok_or_else(|| {
					DoctagError::IndexOutOfRange {
						key: self.key.to_string(),
						tag: tag.to_string(),
						index,
						len: occurrences.len(),
					}
				})?;

				if mask.is_empty() {
					Ok(fields.first().cloned().unwrap_or_default())
				} else {
					Ok(select_masked(fields, &mask))
				}
			}
			Method::Count => {
				let tag = self.arg(0)?;
				Ok(self.block.occurrences(tag).map_or(0, <[_]>::len).to_string())
			}
			Method::Has => {
				let tag = self.arg(0)?;
				Ok(self.block.occurrences(tag).is_some().to_string())
			}
			Method::Meta => {
				let field = self.arg(0)?;
				self.block.meta.field(field).ok_or_else(|| {
					DoctagError::UnknownMeta {
						key: self.key.to_string(),
						field: field.to_string(),
					}
				})
			}
			Method::Each => {
				let tag = self.arg(0)?;
				let template = self.arg(1)?;
				let rendered: Vec<String> = self
					.block
					.occurrences(tag)
					.unwrap_or_default()
					.iter()
					.map(|fields| render_template(template, fields))
					.collect();

				Ok(rendered.join("\n"))
			}
		}
	}
}

/// The field at the first position whose mask bit is set, or empty.
fn select_masked(fields: &[String], mask: &[bool]) -> String {
	mask.iter()
		.position(|bit| *bit)
		.and_then(|position| fields.get(position))
		.cloned()
		.unwrap_or_default()
}

/// Replace every `{…}` placeholder in `template`. Each placeholder is a mask
/// over the occurrence's fields.
fn render_template(template: &str, fields: &[String]) -> String {
	PLACEHOLDER
		.replace_all(template, |captures: &Captures<'_>| {
			let mask: Vec<bool> = captures[1].split(',').map(|bit| bit.trim() == "1").collect();
			select_masked(fields, &mask)
		})
		.into_owned()
}

/// Evaluate a method call against the document.
pub fn evaluate_call(call: &MethodCall, doc: &CanonicalDocument) -> DoctagResult<String> {
	let method: Method = call.method.parse()?;
	let block = doc
		.block(&call.key)
		.ok_or_else(|| DoctagError::UnknownKey(call.key.clone()))?;
	let invocation = Invocation {
		method,
		key: &call.key,
		block,
		args: call.args.iter().map(String::as_str).map(unquote).collect(),
	};

	invocation.run()
}

/// Evaluate one expression. `end` markers evaluate to nothing.
pub fn evaluate(expression: &DslExpression, doc: &CanonicalDocument) -> DoctagResult<String> {
	match &expression.kind {
		ExpressionKind::Method(call) | ExpressionKind::If(call) => evaluate_call(call, doc),
		ExpressionKind::End => Ok(String::new()),
	}
}

/// Decide whether an `if` section is kept.
///
/// A guard naming a key that isn't in the document is false. Guards other
/// than `has` are true unless they produce an empty string, `false` or `0`.
fn evaluate_guard(call: &MethodCall, doc: &CanonicalDocument) -> DoctagResult<bool> {
	if doc.block(&call.key).is_none() {
		warn!(key = %call.key, "conditional references an unknown key, treating it as false");
		return Ok(false);
	}

	let value = evaluate_call(call, doc)?;
	Ok(!matches!(value.trim(), "" | "false" | "0"))
}

/// Pre-computed table of line-start byte offsets.
struct LineTable {
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineTable {
	fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// 0-indexed line containing `offset`.
	fn line_of(&self, offset: usize) -> usize {
		match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		}
	}
}

/// Remove the lines of `if`/`end` sections. A false guard removes its whole
/// section, a true guard removes only the two marker lines, and unmatched
/// markers lose their line.
fn remove_conditional_sections(text: &str, doc: &CanonicalDocument) -> DoctagResult<String> {
	let expressions = find_expressions(text);
	let lines = LineTable::new(text);
	let mut open: Vec<(&DslExpression, &MethodCall)> = Vec::new();
	let mut pairs: Vec<(&DslExpression, &MethodCall, &DslExpression)> = Vec::new();
	let mut removals: Vec<(usize, usize)> = Vec::new();

	for expression in &expressions {
		match &expression.kind {
			ExpressionKind::If(call) => open.push((expression, call)),
			ExpressionKind::End => {
				match open.pop() {
					Some((guard, call)) => pairs.push((guard, call, expression)),
					None => {
						let line = lines.line_of(expression.start);
						removals.push((line, line));
					}
				}
			}
			ExpressionKind::Method(_) => {}
		}
	}

	for (guard, _) in open {
		let line = lines.line_of(guard.start);
		removals.push((line, line));
	}

	if pairs.is_empty() && removals.is_empty() {
		return Ok(text.to_string());
	}

	pairs.sort_by(|a, b| b.2.start.cmp(&a.2.start));

	for (guard, call, end) in pairs {
		let guard_line = lines.line_of(guard.start);
		let end_line = lines.line_of(end.start);

		if evaluate_guard(call, doc)? {
			removals.push((guard_line, guard_line));
			removals.push((end_line, end_line));
		} else {
			removals.push((guard_line, end_line));
		}
	}

	Ok(remove_lines(text, removals))
}

/// Remove inclusive, 0-indexed line ranges. Overlapping ranges are merged and
/// removed from the bottom up.
fn remove_lines(text: &str, mut ranges: Vec<(usize, usize)>) -> String {
	ranges.sort_unstable();

	let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
	for (start, end) in ranges {
		match merged.last_mut() {
			Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
			_ => merged.push((start, end)),
		}
	}

	let mut lines: Vec<&str> = text.split('\n').collect();
	for (start, end) in merged.into_iter().rev() {
		let end = end.min(lines.len().saturating_sub(1));
		if start <= end {
			lines.drain(start..=end);
		}
	}

	lines.join("\n")
}

/// Render a template: resolve conditional sections, then replace every
/// remaining expression with its value.
///
/// Replacements are applied from the last expression to the first so the
/// spans found by the scan stay valid. The first failing expression aborts
/// the render.
pub fn evaluate_dsl(text: &str, doc: &CanonicalDocument) -> DoctagResult<String> {
	let text = remove_conditional_sections(text, doc)?;
	let mut expressions: Vec<DslExpression> = find_expressions(&text)
		.into_iter()
		.filter(|expression| matches!(expression.kind, ExpressionKind::Method(_)))
		.collect();
	expressions.sort_by(|a, b| b.start.cmp(&a.start));

	debug!(expressions = expressions.len(), "substituting expressions");

	let mut result = text.clone();
	for expression in &expressions {
		let value = evaluate(expression, doc)?;
		result.replace_range(expression.start..expression.end, &value);
	}

	Ok(result)
}
