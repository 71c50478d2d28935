use std::collections::BTreeMap;
use std::path::Path;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::DoctagError;
use crate::DoctagResult;
use crate::assembler::DocBlock;

/// Namespace prefix of every canonical key.
pub const KEY_PREFIX: &str = "doc.";

/// Every documented block of a workspace keyed by `doc.<key>`.
///
/// Persisted as JSON between `doctag scan` and `doctag transform`:
///
/// ```json
/// {
///   "doc.add": {
///     "label": "Add",
///     "meta": { "path": "src/math.rs", "line": 3, "file": "math.rs", "ext": "rs", "lastEdit": "...", "key": "add" },
///     "description": [["Sums two numbers"]],
///     "param": [["a", "int", "First"]]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, DerefMut)]
#[serde(transparent)]
pub struct CanonicalDocument(
	#[deref]
	#[deref_mut]
	BTreeMap<String, DocBlock>,
);

impl CanonicalDocument {
	/// The canonical key for a bare block key.
	pub fn canonical_key(key: &str) -> String {
		format!("{KEY_PREFIX}{key}")
	}

	/// Look up a block by its bare key (without the `doc.` prefix).
	pub fn block(&self, key: &str) -> Option<&DocBlock> {
		self.0.get(&Self::canonical_key(key))
	}

	/// Add a block, rejecting a key that is already taken.
	pub fn insert_block(&mut self, block: DocBlock) -> DoctagResult<()> {
		let canonical = Self::canonical_key(block.key());

		if let Some(existing) = self.0.get(&canonical) {
			return Err(DoctagError::DuplicateKey {
				key: block.meta.key.clone(),
				first: existing.meta.location(),
				second: block.meta.location(),
			});
		}

		self.0.insert(canonical, block);
		Ok(())
	}

	pub fn to_json(&self) -> DoctagResult<String> {
		let mut json = serde_json::to_string_pretty(self)?;
		json.push('\n');
		Ok(json)
	}

	pub fn from_json(json: &str) -> DoctagResult<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Write the document to `path`, creating parent directories.
	pub fn write(&self, path: &Path) -> DoctagResult<()> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		std::fs::write(path, self.to_json()?)?;
		debug!(path = %path.display(), blocks = self.len(), "wrote canonical document");

		Ok(())
	}

	pub fn read(path: &Path) -> DoctagResult<Self> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(&json)
	}
}

/// Index assembled blocks by key. Keys must be unique across all blocks.
pub fn generate_canonical_doc(blocks: Vec<DocBlock>) -> DoctagResult<CanonicalDocument> {
	let mut document = CanonicalDocument::default();

	for block in blocks {
		document.insert_block(block)?;
	}

	Ok(document)
}
