use std::sync::LazyLock;

use regex::Regex;

use crate::comments::CommentFragment;

/// A tag line: `@name` optionally followed by whitespace and inline content.
/// Names may be dotted, e.g. `@doc.init`.
static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^@(\w+(?:\.\w+)*)(?:\s+(.*))?$").expect("valid tag line pattern")
});

/// Tags whose content runs across the following lines until the next tag
/// line.
pub const BLOCK_TAGS: [&str; 2] = ["description", "example"];

/// A single `@tag` found in a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
	pub name: String,
	/// Positional arguments of a single-line tag. Always empty for block tags.
	pub args: Vec<String>,
	/// The inline text after the tag name. For block tags this includes the
	/// continuation lines.
	pub content: String,
	/// 1-indexed source line of the tag.
	pub line: usize,
}

impl Tag {
	pub fn is_block(&self) -> bool {
		is_block_tag(&self.name)
	}
}

pub fn is_block_tag(name: &str) -> bool {
	BLOCK_TAGS.contains(&name)
}

fn is_tag_line(line: &str) -> bool {
	TAG_LINE.is_match(line.trim_start())
}

/// Extract the tags of a single comment fragment.
pub fn extract_tags(fragment: &CommentFragment, init_tag: &str) -> Vec<Tag> {
	extract_tags_from_text(&fragment.content, fragment.content_line, init_tag)
}

/// Extract the tags from cleaned comment text whose first line sits on
/// `first_line` in the source file.
///
/// Lines that are neither tag lines nor continuations of an open block tag
/// are ignored.
pub fn extract_tags_from_text(text: &str, first_line: usize, init_tag: &str) -> Vec<Tag> {
	let lines: Vec<&str> = text.split('\n').collect();
	let mut tags = Vec::new();
	let mut index = 0;

	while index < lines.len() {
		let Some(captures) = TAG_LINE.captures(lines[index].trim_start()) else {
			index += 1;
			continue;
		};

		let name = captures[1].to_string();
		let inline = captures.get(2).map_or("", |m| m.as_str());
		let line = first_line + index;
		index += 1;

		if is_block_tag(&name) {
			let mut content = inline.to_string();
			while index < lines.len() && !is_tag_line(lines[index]) {
				content.push('\n');
				content.push_str(lines[index]);
				index += 1;
			}

			tags.push(Tag {
				name,
				args: Vec::new(),
				content: content.trim().to_string(),
				line,
			});
			continue;
		}

		let content = inline.trim();
		let args = if name == init_tag {
			init_args(content)
		} else {
			content.split_whitespace().map(String::from).collect()
		};

		tags.push(Tag {
			name,
			args,
			content: content.to_string(),
			line,
		});
	}

	tags
}

/// The init tag takes a key and an optional label which may contain spaces.
fn init_args(content: &str) -> Vec<String> {
	match content.split_once(char::is_whitespace) {
		Some((key, label)) if !label.trim().is_empty() => {
			vec![key.to_string(), label.trim().to_string()]
		}
		Some((key, _)) => vec![key.to_string()],
		None if content.is_empty() => Vec::new(),
		None => vec![content.to_string()],
	}
}
