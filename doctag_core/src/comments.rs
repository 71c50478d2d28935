use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::styles::CommentStyle;
use crate::styles::Delimiters;

/// Leading `*` gutter inside block comments, stripped from every line.
static SOFT_MARKER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s*\*\s?").expect("valid soft marker pattern"));

/// The syntactic form a comment fragment was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentKind {
	SingleLine,
	MultiLine,
	DocSingle,
	DocMulti,
}

impl CommentKind {
	/// Whether the fragment was written with a line prefix such as `//` or
	/// `///`.
	pub fn is_line_comment(self) -> bool {
		matches!(self, Self::SingleLine | Self::DocSingle)
	}
}

/// One comment extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentFragment {
	/// The source lines spanned by the comment, joined by `\n`.
	pub raw: String,
	/// 1-indexed line of the comment opener.
	pub line: usize,
	/// 1-indexed byte column of the comment opener.
	pub column: usize,
	pub kind: CommentKind,
	/// The comment text with delimiters, `*` gutters and surrounding
	/// whitespace removed.
	pub content: String,
	/// 1-indexed line holding the first line of `content`. Differs from `line`
	/// when a block comment opens with an empty line, as in `/**`.
	pub content_line: usize,
}

impl CommentFragment {
	/// 1-indexed line of the last source line the comment spans.
	pub fn end_line(&self) -> usize {
		self.line + self.raw.matches('\n').count()
	}
}

/// A block comment that has been opened but not yet closed.
struct OpenComment<'a> {
	kind: CommentKind,
	delimiters: &'a Delimiters,
	line: usize,
	column: usize,
	raw: Vec<&'a str>,
	body: Vec<&'a str>,
}

impl<'a> OpenComment<'a> {
	/// Start a block comment if `line` contains an opening delimiter.
	///
	/// The earliest opener wins. When the plain and doc openers start at the
	/// same offset (`{-` and `{-|`) the longer doc opener wins, unless the
	/// plain comment is empty there, as in `/**/`.
	fn open(line: &'a str, number: usize, style: &'a CommentStyle) -> Option<Self> {
		let plain = style.multi.as_ref().filter(|d| !d.start.is_empty());
		let doc = style.doc_multi.as_ref().filter(|d| !d.start.is_empty());

		let plain_match = plain.and_then(|d| {
			line.find(d.start.as_str())
				.map(|start| (d, CommentKind::MultiLine, start))
		});
		let doc_match = doc.and_then(|d| {
			let start = line.find(d.start.as_str())?;
			let empty_plain = plain.is_some_and(|p| {
				line[start..]
					.strip_prefix(p.start.as_str())
					.is_some_and(|rest| !p.end.is_empty() && rest.starts_with(p.end.as_str()))
			});
			(!empty_plain).then_some((d, CommentKind::DocMulti, start))
		});

		let (delimiters, kind, start) = plain_match
			.into_iter()
			.chain(doc_match)
			.min_by_key(|(delimiters, _, start)| (*start, Reverse(delimiters.start.len())))?;

		Some(Self {
			kind,
			delimiters,
			line: number,
			column: start + 1,
			raw: vec![line],
			body: vec![&line[start + delimiters.start.len()..]],
		})
	}

	/// Look for the closing delimiter in the most recent body line. Returns
	/// `true` when the comment is complete.
	fn try_close(&mut self) -> bool {
		let Some(last) = self.body.last_mut() else {
			return false;
		};

		if self.delimiters.end.is_empty() {
			return false;
		}

		let body: &'a str = *last;
		match body.find(self.delimiters.end.as_str()) {
			Some(close) => {
				*last = &body[..close];
				true
			}
			None => false,
		}
	}

	fn push_line(&mut self, line: &'a str) {
		self.raw.push(line);
		self.body.push(line);
	}

	fn finish(self) -> CommentFragment {
		let cleaned: Vec<String> = self
			.body
			.iter()
			.map(|line| SOFT_MARKER.replace(line, "").trim().to_string())
			.collect();
		let leading_blank = cleaned.iter().take_while(|line| line.is_empty()).count();
		let content_line = if leading_blank < cleaned.len() {
			self.line + leading_blank
		} else {
			self.line
		};

		CommentFragment {
			raw: self.raw.join("\n"),
			line: self.line,
			column: self.column,
			kind: self.kind,
			content: cleaned.join("\n").trim().to_string(),
			content_line,
		}
	}
}

/// Read a line comment if the trimmed line starts with one of `prefixes`.
fn line_comment(
	line: &str,
	number: usize,
	prefixes: &[String],
	kind: CommentKind,
) -> Option<CommentFragment> {
	let trimmed = line.trim_start();
	let prefix = prefixes
		.iter()
		.find(|prefix| !prefix.is_empty() && trimmed.starts_with(prefix.as_str()))?;

	Some(CommentFragment {
		raw: line.to_string(),
		line: number,
		column: line.len() - trimmed.len() + 1,
		kind,
		content: trimmed[prefix.len()..].trim().to_string(),
		content_line: number,
	})
}

/// Split source text into comment fragments according to `style`.
///
/// Each line outside a block comment is classified in order: doc line
/// prefixes, plain line prefixes, then block comment openers anywhere in the
/// line. Line prefixes only count at the start of a line, so trailing comments
/// after code are not collected. A block comment still open at the end of the
/// input is closed there.
pub fn tokenize(text: &str, style: &CommentStyle) -> Vec<CommentFragment> {
	let mut fragments = Vec::new();
	let mut open: Option<OpenComment<'_>> = None;

	for (index, line) in text.split('\n').enumerate() {
		let line = line.strip_suffix('\r').unwrap_or(line);
		let number = index + 1;

		if let Some(mut comment) = open.take() {
			comment.push_line(line);
			if comment.try_close() {
				fragments.push(comment.finish());
			} else {
				open = Some(comment);
			}
			continue;
		}

		if let Some(fragment) = line_comment(line, number, &style.doc_single, CommentKind::DocSingle)
			.or_else(|| line_comment(line, number, &style.single, CommentKind::SingleLine))
		{
			fragments.push(fragment);
			continue;
		}

		if let Some(mut comment) = OpenComment::open(line, number, style) {
			if comment.try_close() {
				fragments.push(comment.finish());
			} else {
				open = Some(comment);
			}
		}
	}

	if let Some(comment) = open {
		fragments.push(comment.finish());
	}

	fragments
}
