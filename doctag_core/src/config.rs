use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::DoctagError;
use crate::DoctagResult;
use crate::styles::CommentPatternOverride;
use crate::styles::CommentStyleTable;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// The tag that opens a documented block unless configured otherwise.
pub const DEFAULT_INIT_TAG: &str = "doc";

/// Where `doctag scan` writes the canonical document unless configured
/// otherwise.
pub const DEFAULT_CANONICAL_PATH: &str = "doctag.canonical.json";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 4] = [
	"doctag.json",
	".doctag.json",
	"doctag.toml",
	".config/doctag.toml",
];

/// Configuration loaded from `doctag.json` or `doctag.toml`.
///
/// ```json
/// {
///   "initTag": "doc",
///   "commentPatterns": {
///     "nim": { "single": ["#"] }
///   },
///   "languages": { "inc": "c" },
///   "include": ["scripts/**/*.nim"],
///   "exclude": ["vendor/", "*.min.js"],
///   "canonicalPath": "docs/doctag.json",
///   "transform": { "entry": "docs/templates", "output": "docs" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctagConfig {
	/// The tag that opens a documented block, without the `@`.
	#[serde(default = "default_init_tag")]
	pub init_tag: String,
	/// Comment syntax overrides keyed by extension or language id.
	#[serde(default)]
	pub comment_patterns: BTreeMap<String, CommentPatternOverride>,
	/// Extension to language id routing, e.g. `"inc": "c"`.
	#[serde(default)]
	pub languages: BTreeMap<String, String>,
	/// Extra glob patterns to scan. When set, files matching them are scanned
	/// even when their extension has no registered comment style.
	#[serde(default)]
	pub include: Vec<String>,
	/// Gitignore-style patterns excluded from the scan.
	#[serde(default)]
	pub exclude: Vec<String>,
	/// When true, `.gitignore` files are not used for filtering.
	#[serde(default)]
	pub disable_gitignore: bool,
	/// Files larger than this many bytes are skipped.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// Canonical document location, relative to the workspace root.
	#[serde(default = "default_canonical_path")]
	pub canonical_path: PathBuf,
	#[serde(default)]
	pub transform: TransformConfig,
}

/// Directories used by `doctag transform` when no files are given.
///
/// Every markdown file under `entry` is rendered to the same relative path
/// under `output`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
	#[serde(default)]
	pub entry: Option<PathBuf>,
	#[serde(default)]
	pub output: Option<PathBuf>,
}

impl TransformConfig {
	/// Both directories, when both are configured.
	pub fn directories(&self) -> Option<(&Path, &Path)> {
		Some((self.entry.as_deref()?, self.output.as_deref()?))
	}
}

fn default_init_tag() -> String {
	DEFAULT_INIT_TAG.to_string()
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

fn default_canonical_path() -> PathBuf {
	PathBuf::from(DEFAULT_CANONICAL_PATH)
}

impl Default for DoctagConfig {
	fn default() -> Self {
		Self {
			init_tag: default_init_tag(),
			comment_patterns: BTreeMap::new(),
			languages: BTreeMap::new(),
			include: Vec::new(),
			exclude: Vec::new(),
			disable_gitignore: false,
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			canonical_path: default_canonical_path(),
			transform: TransformConfig::default(),
		}
	}
}

impl DoctagConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> DoctagResult<Option<DoctagConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::from_path(&config_path).map(Some)
	}

	/// Load the config from `root`, or the defaults when none exists.
	pub fn load_or_default(root: &Path) -> DoctagResult<DoctagConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	/// Read a config file. The format follows the extension: `.toml` is TOML,
	/// anything else is JSON.
	pub fn from_path(path: &Path) -> DoctagResult<DoctagConfig> {
		let content = std::fs::read_to_string(path)?;
		let is_toml = path
			.extension()
			.is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

		let parsed = if is_toml {
			toml::from_str(&content).map_err(|e| e.to_string())
		} else {
			serde_json::from_str(&content).map_err(|e| e.to_string())
		};

		let config: DoctagConfig = parsed.map_err(|reason| {
			DoctagError::ConfigParse {
				path: path.display().to_string(),
				reason,
			}
		})?;

		if config.init_tag.trim().is_empty() {
			return Err(DoctagError::ConfigParse {
				path: path.display().to_string(),
				reason: "`initTag` must not be empty".to_string(),
			});
		}

		Ok(config)
	}

	/// The canonical document path resolved against `root`.
	pub fn canonical_path(&self, root: &Path) -> PathBuf {
		root.join(&self.canonical_path)
	}

	/// Build the immutable settings threaded through the scan pipeline.
	pub fn scan_config(&self) -> ScanConfig {
		let mut styles = CommentStyleTable::builtin();

		for (ext, language) in &self.languages {
			styles.map_extension(ext, language);
		}
		styles.apply_overrides(&self.comment_patterns);

		ScanConfig {
			init_tag: self.init_tag.trim().trim_start_matches('@').to_string(),
			styles,
		}
	}
}

/// Settings for tokenizing and assembling one file, built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
	/// The tag that opens a documented block, without the `@`.
	pub init_tag: String,
	pub styles: CommentStyleTable,
}

impl Default for ScanConfig {
	fn default() -> Self {
		DoctagConfig::default().scan_config()
	}
}

/// The config written by `doctag init`.
pub const SAMPLE_CONFIG: &str = r#"{
  "initTag": "doc",
  "include": [],
  "exclude": [],
  "canonicalPath": "doctag.canonical.json",
  "transform": {}
}
"#;
