use std::collections::BTreeMap;
use std::path::Path;

use crate::CanonicalDocument;
use crate::DocBlock;
use crate::DocMeta;

pub(crate) const CALCULATOR_RS: &str = r"/// @doc calculator Calculator
/// @description A calculator for integers
/// @example
/// ```rust
/// let calc = Calculator::new();
/// let sum = calc.add(5, 3);
/// ```
pub struct Calculator;

impl Calculator {
	/// @doc calculator_new new
	/// @description Creates a calculator
	/// @returns Calculator A fresh instance
	pub fn new() -> Self {
		Calculator
	}

	/// @doc calculator_add add
	/// @description Adds two integers
	/// @param a i32 First number
	/// @param b i32 Second number
	/// @returns i32 The sum
	pub fn add(&self, a: i32, b: i32) -> i32 {
		a + b
	}
}
";

pub(crate) const GEOMETRY_PY: &str = r#"# @doc.init geometry Geometry
# @description Geometry helpers

class Geometry:
    """Shapes and measurements"""

    # @doc.init area area
    # @description Area of a rectangle
    # @param width float Width of the rectangle
    # @param height float Height of the rectangle
    # @returns float The area
    # @example
    # ```python
    # Geometry.area(2, 3)  # 6
    # ```
    @staticmethod
    def area(width: float, height: float) -> float:
        return width * height
"#;

pub(crate) const VECTOR_CPP: &str = r"/**
 * @doc.init vector Vector
 * @description A vector in three dimensions
 * @param x float X component
 */
class Vector {
	// @doc.init vector_length length
	// @returns float The euclidean length
	float length() const;
};
";

/// Build a block by hand. `tags` lists `(name, occurrences)`.
pub(crate) fn block(key: &str, label: &str, tags: &[(&str, &[&[&str]])]) -> DocBlock {
	let tags: BTreeMap<String, Vec<Vec<String>>> = tags
		.iter()
		.map(|(name, occurrences)| {
			let occurrences: Vec<Vec<String>> = occurrences
				.iter()
				.map(|fields| fields.iter().map(ToString::to_string).collect())
				.collect();
			((*name).to_string(), occurrences)
		})
		.collect();

	DocBlock {
		label: label.to_string(),
		meta: DocMeta {
			path: "src/math.rs".to_string(),
			line: 3,
			file: "math.rs".to_string(),
			ext: "rs".to_string(),
			last_edit: "2024-05-01T10:00:00.000Z".to_string(),
			key: key.to_string(),
		},
		tags,
	}
}

/// The `add` function with two params and no example.
pub(crate) fn add_block() -> DocBlock {
	block(
		"add",
		"Add",
		&[
			("description", &[&["Sums two numbers"]]),
			(
				"param",
				&[&["a", "int", "First"], &["b", "int", "Second"]],
			),
			("returns", &[&["int", "Sum"]]),
		],
	)
}

pub(crate) fn add_document() -> CanonicalDocument {
	let mut document = CanonicalDocument::default();
	document.insert(CanonicalDocument::canonical_key("add"), add_block());
	document
}

pub(crate) fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}
