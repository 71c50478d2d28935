use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// An opening and closing delimiter pair for comments spanning several lines,
/// e.g. `/*` and `*/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
	pub start: String,
	pub end: String,
}

impl Delimiters {
	pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
		Self {
			start: start.into(),
			end: end.into(),
		}
	}
}

/// The comment syntax recognized for one language.
///
/// Prefix lists are ordered: the first matching prefix wins. Doc prefixes are
/// always tried before plain prefixes, so `///` is never read as `//`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentStyle {
	/// Plain single-line prefixes, e.g. `//` or `#`.
	#[serde(default)]
	pub single: Vec<String>,
	/// Documentation single-line prefixes, e.g. `///` or `//!`.
	#[serde(default)]
	pub doc_single: Vec<String>,
	/// Plain multi-line delimiters, e.g. `/*` and `*/`.
	#[serde(default)]
	pub multi: Option<Delimiters>,
	/// Documentation multi-line delimiters, e.g. `/**` and `*/`.
	#[serde(default)]
	pub doc_multi: Option<Delimiters>,
}

impl CommentStyle {
	/// The style assumed for any extension without a registered style: `//`
	/// line comments and `/* */` block comments.
	pub fn c_like() -> Self {
		Self {
			single: vec!["//".into()],
			doc_single: vec!["///".into()],
			multi: Some(Delimiters::new("/*", "*/")),
			doc_multi: Some(Delimiters::new("/**", "*/")),
		}
	}

	fn rust() -> Self {
		Self {
			doc_single: vec!["///".into(), "//!".into()],
			..Self::c_like()
		}
	}

	fn python() -> Self {
		Self {
			single: vec!["#".into()],
			doc_single: Vec::new(),
			multi: Some(Delimiters::new("\"\"\"", "\"\"\"")),
			doc_multi: Some(Delimiters::new("'''", "'''")),
		}
	}

	fn ruby() -> Self {
		Self {
			single: vec!["#".into()],
			doc_single: Vec::new(),
			multi: Some(Delimiters::new("=begin", "=end")),
			doc_multi: None,
		}
	}

	fn hash() -> Self {
		Self {
			single: vec!["#".into()],
			..Self::default()
		}
	}

	fn sql() -> Self {
		Self {
			single: vec!["--".into()],
			doc_single: Vec::new(),
			multi: Some(Delimiters::new("/*", "*/")),
			doc_multi: None,
		}
	}

	fn lua() -> Self {
		Self {
			single: vec!["--".into()],
			doc_single: vec!["---".into()],
			..Self::default()
		}
	}

	fn haskell() -> Self {
		Self {
			single: vec!["--".into()],
			doc_single: vec!["-- |".into()],
			multi: Some(Delimiters::new("{-", "-}")),
			doc_multi: Some(Delimiters::new("{-|", "-}")),
		}
	}

	fn css() -> Self {
		Self {
			multi: Some(Delimiters::new("/*", "*/")),
			..Self::default()
		}
	}

	fn markup() -> Self {
		Self {
			multi: Some(Delimiters::new("<!--", "-->")),
			..Self::default()
		}
	}

	/// Merge an override into this style. Every field present in the override
	/// replaces the corresponding field here.
	pub fn merge(&mut self, custom: &CommentPatternOverride) {
		if let Some(single) = &custom.single {
			self.single.clone_from(single);
		}
		if let Some(doc_single) = &custom.doc_single {
			self.doc_single.clone_from(doc_single);
		}
		if let Some(multi) = &custom.multi {
			self.multi = Some(multi.clone());
		}
		if let Some(doc_multi) = &custom.doc_multi {
			self.doc_multi = Some(doc_multi.clone());
		}
	}
}

/// A partial [`CommentStyle`] read from the `commentPatterns` section of the
/// config. Only the fields that are set take effect.
///
/// ```json
/// {
///   "commentPatterns": {
///     "nim": { "single": ["#"], "multi": { "start": "#[", "end": "]#" } }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPatternOverride {
	#[serde(default)]
	pub single: Option<Vec<String>>,
	#[serde(default)]
	pub doc_single: Option<Vec<String>>,
	#[serde(default)]
	pub multi: Option<Delimiters>,
	#[serde(default)]
	pub doc_multi: Option<Delimiters>,
}

/// Built-in languages as `(language id, extensions, style)`.
fn builtin_languages() -> Vec<(&'static str, &'static [&'static str], CommentStyle)> {
	vec![
		("rust", &["rs"], CommentStyle::rust()),
		(
			"c",
			&[
				"c", "h", "cc", "cpp", "cxx", "hpp", "hh", "cs", "java", "js", "jsx", "mjs", "cjs",
				"ts", "tsx", "mts", "cts", "go", "kt", "kts", "swift", "scala", "dart", "php",
			],
			CommentStyle::c_like(),
		),
		("python", &["py", "pyi"], CommentStyle::python()),
		("ruby", &["rb"], CommentStyle::ruby()),
		(
			"shell",
			&["sh", "bash", "zsh", "fish", "yaml", "yml", "toml", "r", "pl", "ps1"],
			CommentStyle::hash(),
		),
		("sql", &["sql"], CommentStyle::sql()),
		("lua", &["lua"], CommentStyle::lua()),
		("haskell", &["hs", "lhs", "elm"], CommentStyle::haskell()),
		("css", &["css"], CommentStyle::css()),
		(
			"scss",
			&["scss", "less"],
			CommentStyle {
				doc_single: Vec::new(),
				doc_multi: None,
				..CommentStyle::c_like()
			},
		),
		(
			"markup",
			&["html", "htm", "xml", "svg", "vue", "svelte", "md", "mdx", "markdown"],
			CommentStyle::markup(),
		),
	]
}

/// Maps file extensions and language ids to their [`CommentStyle`].
///
/// Lookups never fail: an unknown extension resolves to
/// [`CommentStyle::c_like`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentStyleTable {
	/// Styles keyed by language id (e.g. `rust`, `python`).
	languages: BTreeMap<String, CommentStyle>,
	/// Lowercase extension (without the dot) to language id.
	extensions: BTreeMap<String, String>,
	fallback: CommentStyle,
}

impl Default for CommentStyleTable {
	fn default() -> Self {
		Self::builtin()
	}
}

impl CommentStyleTable {
	/// The table of styles shipped with doctag.
	pub fn builtin() -> Self {
		let mut languages = BTreeMap::new();
		let mut extensions = BTreeMap::new();

		for (language, exts, style) in builtin_languages() {
			for ext in exts {
				extensions.insert((*ext).to_string(), language.to_string());
			}
			languages.insert(language.to_string(), style);
		}

		Self {
			languages,
			extensions,
			fallback: CommentStyle::c_like(),
		}
	}

	/// Resolve the style for `path`. A `language` override naming a known
	/// language id takes precedence over the extension.
	pub fn style_for(&self, path: &Path, language: Option<&str>) -> &CommentStyle {
		if let Some(style) = language.and_then(|id| self.languages.get(&normalize_key(id))) {
			return style;
		}

		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(|ext| self.extensions.get(&normalize_key(ext)))
			.and_then(|language| self.languages.get(language))
			.unwrap_or(&self.fallback)
	}

	/// Resolve the style for a bare extension or language id.
	pub fn style_for_key(&self, key: &str) -> &CommentStyle {
		let key = normalize_key(key);
		self.languages
			.get(&key)
			.or_else(|| {
				self.extensions
					.get(&key)
					.and_then(|language| self.languages.get(language))
			})
			.unwrap_or(&self.fallback)
	}

	/// Whether `ext` has a registered style, built in or custom.
	pub fn knows_extension(&self, ext: &str) -> bool {
		self.extensions.contains_key(&normalize_key(ext))
	}

	/// Route an extension to a language id, e.g. `"inc" => "c"`.
	pub fn map_extension(&mut self, ext: &str, language: &str) {
		self.extensions
			.insert(normalize_key(ext), normalize_key(language));
	}

	/// Apply the `commentPatterns` overrides from configuration.
	///
	/// A key naming a language id updates that language. A key naming an
	/// extension gets its own entry, seeded from the extension's current style,
	/// so that sibling extensions sharing the language are unaffected. Any
	/// other key registers a new extension with only the given fields.
	pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, CommentPatternOverride>) {
		for (key, custom) in overrides {
			let key = normalize_key(key);

			if let Some(style) = self.languages.get_mut(&key) {
				style.merge(custom);
				continue;
			}

			let mut style = match self.extensions.get(&key) {
				Some(language) => self.languages.get(language).cloned().unwrap_or_default(),
				None => CommentStyle::default(),
			};
			style.merge(custom);

			let language = format!("ext:{key}");
			self.languages.insert(language.clone(), style);
			self.extensions.insert(key, language);
		}
	}
}

fn normalize_key(key: &str) -> String {
	key.trim().trim_start_matches('.').to_ascii_lowercase()
}
