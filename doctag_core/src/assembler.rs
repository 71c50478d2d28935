use std::collections::BTreeMap;
use std::path::Path;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::DoctagError;
use crate::DoctagResult;
use crate::comments::CommentFragment;
use crate::comments::tokenize;
use crate::config::ScanConfig;
use crate::tags::Tag;
use crate::tags::extract_tags;
use crate::tags::extract_tags_from_text;

/// Field names reserved by the serialized block layout.
const RESERVED_FIELDS: [&str; 2] = ["label", "meta"];

/// Where a block was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMeta {
	/// Path relative to the workspace root, with `/` separators.
	pub path: String,
	/// 1-indexed line of the comment that opened the block.
	pub line: usize,
	/// File name without directories.
	pub file: String,
	/// Extension without the leading dot.
	pub ext: String,
	/// Last modification time of the file, RFC 3339.
	pub last_edit: String,
	pub key: String,
}

impl DocMeta {
	/// Look up a metadata field by its serialized name.
	pub fn field(&self, name: &str) -> Option<String> {
		let value = match name {
			"path" => self.path.clone(),
			"line" => self.line.to_string(),
			"file" => self.file.clone(),
			"ext" => self.ext.clone(),
			"lastEdit" | "last_edit" => self.last_edit.clone(),
			"key" => self.key.clone(),
			_ => return None,
		};

		Some(value)
	}

	/// `path:line`, used when reporting where a block lives.
	pub fn location(&self) -> String {
		format!("{}:{}", self.path, self.line)
	}
}

/// One documented unit: everything between an init tag and the next one.
///
/// Each tag name maps to its occurrences in source order, and each occurrence
/// is a list of positional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocBlock {
	pub label: String,
	pub meta: DocMeta,
	#[serde(flatten)]
	pub tags: BTreeMap<String, Vec<Vec<String>>>,
}

impl DocBlock {
	pub fn key(&self) -> &str {
		&self.meta.key
	}

	/// All occurrences of `tag`, or `None` when the block never uses it.
	pub fn occurrences(&self, tag: &str) -> Option<&[Vec<String>]> {
		self.tags.get(tag).map(Vec::as_slice)
	}
}

/// Split a tag into its positional fields.
///
/// - `param` becomes `[name, type, description]` with at least three tokens.
/// - `returns` becomes `[type, description]` with at least two tokens.
/// - block tags keep their content as a single field.
/// - everything else is split on whitespace.
pub fn split_fields(tag: &Tag) -> Vec<String> {
	if tag.is_block() {
		return vec![tag.content.clone()];
	}

	let leading = match tag.name.as_str() {
		"param" => 2,
		"returns" => 1,
		_ => 0,
	};

	if leading > 0 {
		if let Some((mut fields, rest)) = take_tokens(&tag.content, leading) {
			if !rest.is_empty() {
				fields.push(rest);
				return fields.into_iter().map(String::from).collect();
			}
		}
	}

	tag.content.split_whitespace().map(String::from).collect()
}

/// Take `count` whitespace-separated tokens, returning them with the trimmed
/// remainder.
fn take_tokens(content: &str, count: usize) -> Option<(Vec<&str>, &str)> {
	let mut rest = content.trim_start();
	let mut tokens = Vec::with_capacity(count + 1);

	for _ in 0..count {
		if rest.is_empty() {
			return None;
		}
		let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
		tokens.push(&rest[..end]);
		rest = rest[end..].trim_start();
	}

	Some((tokens, rest.trim_end()))
}

/// Group fragments into runs to re-parse together. Line comments on
/// consecutive lines form one run, so block tags continue across them.
fn join_adjacent(fragments: &[&CommentFragment]) -> Vec<(String, usize)> {
	let mut runs: Vec<(String, usize)> = Vec::new();
	let mut previous: Option<&CommentFragment> = None;

	for fragment in fragments {
		let continues = previous.is_some_and(|prev| {
			prev.kind.is_line_comment()
				&& fragment.kind.is_line_comment()
				&& fragment.line == prev.end_line() + 1
		});

		match runs.last_mut() {
			Some((text, _)) if continues => {
				text.push('\n');
				text.push_str(&fragment.content);
			}
			_ => runs.push((fragment.content.clone(), fragment.content_line)),
		}

		previous = Some(fragment);
	}

	runs
}

/// The fragments that make up one block, before finalization.
struct PendingBlock<'a> {
	init: Tag,
	fragments: Vec<&'a CommentFragment>,
}

impl PendingBlock<'_> {
	fn finish(self, file: &Path, root: &Path, config: &ScanConfig) -> DoctagResult<DocBlock> {
		let Some(key) = self.init.args.first().cloned() else {
			return Err(DoctagError::MissingKey {
				tag: config.init_tag.clone(),
				file: relative_path(file, root),
				line: self.init.line,
			});
		};
		let label = self.init.args.get(1).cloned().unwrap_or_else(|| key.clone());
		let mut tags: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();

		for (text, first_line) in join_adjacent(&self.fragments) {
			for tag in extract_tags_from_text(&text, first_line, &config.init_tag) {
				if tag.name == config.init_tag {
					continue;
				}

				if RESERVED_FIELDS.contains(&tag.name.as_str()) {
					warn!(
						file = %file.display(),
						line = tag.line,
						tag = %tag.name,
						"tag name is reserved by the canonical document, ignoring it"
					);
					continue;
				}

				let fields = split_fields(&tag);
				tags.entry(tag.name).or_default().push(fields);
			}
		}

		let meta = DocMeta {
			path: relative_path(file, root),
			line: self.fragments.first().map_or(self.init.line, |f| f.line),
			file: file
				.file_name()
				.map(|name| name.to_string_lossy().to_string())
				.unwrap_or_default(),
			ext: file
				.extension()
				.map(|ext| ext.to_string_lossy().to_string())
				.unwrap_or_default(),
			last_edit: last_edit(file),
			key,
		};

		debug!(key = %meta.key, location = %meta.location(), "assembled block");

		Ok(DocBlock { label, meta, tags })
	}
}

/// Assemble the comment fragments of one file into documented blocks.
///
/// A fragment carrying the init tag closes the open block and starts a new
/// one. Other fragments join the open block, or are ignored before the
/// first block. An init tag without a key is an error.
pub fn assemble_blocks(
	fragments: &[CommentFragment],
	file: &Path,
	root: &Path,
	config: &ScanConfig,
) -> DoctagResult<Vec<DocBlock>> {
	let mut blocks = Vec::new();
	let mut pending: Option<PendingBlock<'_>> = None;

	for fragment in fragments {
		let init = extract_tags(fragment, &config.init_tag)
			.into_iter()
			.find(|tag| tag.name == config.init_tag);

		if let Some(init) = init {
			if let Some(block) = pending.take() {
				blocks.push(block.finish(file, root, config)?);
			}
			pending = Some(PendingBlock {
				init,
				fragments: vec![fragment],
			});
		} else if let Some(block) = pending.as_mut() {
			block.fragments.push(fragment);
		}
	}

	if let Some(block) = pending {
		blocks.push(block.finish(file, root, config)?);
	}

	Ok(blocks)
}

/// Run the whole per-file pipeline on `content`: style lookup, tokenizing
/// and assembly.
pub fn extract_blocks(
	content: &str,
	file: &Path,
	root: &Path,
	config: &ScanConfig,
) -> DoctagResult<Vec<DocBlock>> {
	let style = config.styles.style_for(file, None);
	let fragments = tokenize(content, style);
	assemble_blocks(&fragments, file, root, config)
}

/// Render `file` relative to `root` with forward slashes.
pub fn relative_path(file: &Path, root: &Path) -> String {
	file.strip_prefix(root)
		.unwrap_or(file)
		.to_string_lossy()
		.replace('\\', "/")
}

/// The file's modification time, or now when it can't be read.
fn last_edit(file: &Path) -> String {
	let modified = std::fs::metadata(file).and_then(|metadata| metadata.modified());
	let time: DateTime<Utc> = match modified {
		Ok(time) => time.into(),
		Err(error) => {
			warn!(
				file = %file.display(),
				%error,
				"could not read the modification time, using the current time"
			);
			Utc::now()
		}
	};

	time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
