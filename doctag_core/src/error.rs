use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DoctagError {
	#[error(transparent)]
	#[diagnostic(code(doctag::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file `{path}`: {reason}")]
	#[diagnostic(
		code(doctag::config_parse),
		help("check that the config is valid JSON (doctag.json) or TOML (doctag.toml)")
	)]
	ConfigParse { path: String, reason: String },

	#[error("invalid glob or exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(doctag::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("`@{tag}` at {file}:{line} is missing a key")]
	#[diagnostic(
		code(doctag::missing_key),
		help("write the key right after the tag, e.g. `@{tag} my_key My Label`")
	)]
	MissingKey {
		tag: String,
		file: String,
		line: usize,
	},

	#[error("duplicate key `{key}`: defined at `{first}` and `{second}`")]
	#[diagnostic(
		code(doctag::duplicate_key),
		help("each documented block needs a key that is unique across the workspace")
	)]
	DuplicateKey {
		key: String,
		first: String,
		second: String,
	},

	#[error("invalid expression `{expression}`: {reason}")]
	#[diagnostic(
		code(doctag::expression_syntax),
		help("expressions look like `{{{{ @doc.key:method(args) }}}}`")
	)]
	ExpressionSyntax { expression: String, reason: String },

	#[error("no documented block found for `doc.{0}`")]
	#[diagnostic(
		code(doctag::unknown_key),
		help("run `doctag scan` again or check the key in the template")
	)]
	UnknownKey(String),

	#[error("block `doc.{key}` has no `@{tag}` tag")]
	#[diagnostic(code(doctag::unknown_tag))]
	UnknownTag { key: String, tag: String },

	#[error("index {index} is out of range for `@{tag}` in `doc.{key}` ({len} occurrence(s))")]
	#[diagnostic(code(doctag::index_out_of_range))]
	IndexOutOfRange {
		key: String,
		tag: String,
		index: usize,
		len: usize,
	},

	#[error("unknown metadata field `{field}` on `doc.{key}`")]
	#[diagnostic(
		code(doctag::unknown_meta),
		help("available fields: path, line, file, ext, lastEdit, key")
	)]
	UnknownMeta { key: String, field: String },

	#[error("unknown method `{0}`")]
	#[diagnostic(
		code(doctag::unknown_method),
		help("available methods: get, count, has, meta, each")
	)]
	UnknownMethod(String),

	#[error("invalid argument {position} for `{method}`: {reason}")]
	#[diagnostic(code(doctag::invalid_argument))]
	InvalidArgument {
		method: String,
		position: usize,
		reason: String,
	},

	#[error("failed to read or write the canonical document: {0}")]
	#[diagnostic(
		code(doctag::canonical_json),
		help("the canonical document is produced by `doctag scan`")
	)]
	CanonicalJson(#[from] serde_json::Error),

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(doctag::file_too_large),
		help("increase `maxFileSize` in the config or exclude this file")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },
}

pub type DoctagResult<T> = Result<T, DoctagError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
