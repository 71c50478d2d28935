use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::DoctagError;
use crate::DoctagResult;
use crate::assembler::DocBlock;
use crate::assembler::extract_blocks;
use crate::assembler::relative_path;
use crate::canonical::CanonicalDocument;
use crate::canonical::generate_canonical_doc;
use crate::config::DoctagConfig;
use crate::config::ScanConfig;
use crate::dsl::evaluate_dsl;

/// A file that was skipped during a scan, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanDiagnostic {
	/// Path relative to the workspace root.
	pub file: String,
	/// 1-indexed line, when the failure points at one.
	pub line: Option<usize>,
	pub message: String,
}

impl ScanDiagnostic {
	fn from_error(file: &Path, root: &Path, error: &DoctagError) -> Self {
		let line = match error {
			DoctagError::MissingKey { line, .. } => Some(*line),
			_ => None,
		};

		Self {
			file: relative_path(file, root),
			line,
			message: error.to_string(),
		}
	}
}

/// The outcome of scanning a workspace.
#[derive(Debug)]
pub struct ScanResult {
	pub document: CanonicalDocument,
	/// Files and directories that were skipped because they could not be
	/// read or assembled.
	pub diagnostics: Vec<ScanDiagnostic>,
	/// Number of files the pipeline ran on, skipped ones included.
	pub files_scanned: usize,
}

impl ScanResult {
	pub fn is_clean(&self) -> bool {
		self.diagnostics.is_empty()
	}
}

/// Scan `root` with the config discovered there, or the defaults.
pub fn scan_workspace_with_config(root: &Path) -> DoctagResult<(DoctagConfig, ScanResult)> {
	let config = DoctagConfig::load_or_default(root)?;
	let result = scan_workspace(root, &config)?;
	Ok((config, result))
}

/// Scan every source file under `root` and index the documented blocks.
///
/// Files are processed one at a time in sorted path order. A file that can't
/// be read or assembled is logged, recorded as a diagnostic and skipped, and
/// so is a subdirectory that can't be listed. Two blocks sharing a key abort
/// the scan.
pub fn scan_workspace(root: &Path, config: &DoctagConfig) -> DoctagResult<ScanResult> {
	let scan_config = config.scan_config();
	let CollectedFiles { files, unreadable } = collect_source_files(root, config, &scan_config)?;
	let mut blocks = Vec::new();
	let mut diagnostics: Vec<ScanDiagnostic> = unreadable
		.iter()
		.map(|(dir, error)| ScanDiagnostic::from_error(dir, root, error))
		.collect();

	for file in &files {
		match scan_file(file, root, config, &scan_config) {
			Ok(found) => {
				debug!(file = %file.display(), blocks = found.len(), "scanned file");
				blocks.extend(found);
			}
			Err(error) => {
				warn!(file = %file.display(), %error, "skipping file");
				diagnostics.push(ScanDiagnostic::from_error(file, root, &error));
			}
		}
	}

	let document = generate_canonical_doc(blocks)?;

	Ok(ScanResult {
		document,
		diagnostics,
		files_scanned: files.len(),
	})
}

/// Run the per-file pipeline on one file.
pub fn scan_file(
	file: &Path,
	root: &Path,
	config: &DoctagConfig,
	scan_config: &ScanConfig,
) -> DoctagResult<Vec<DocBlock>> {
	let size = std::fs::metadata(file)?.len();
	if size > config.max_file_size {
		return Err(DoctagError::FileTooLarge {
			path: relative_path(file, root),
			size,
			limit: config.max_file_size,
		});
	}

	let content = std::fs::read_to_string(file)?;
	extract_blocks(&normalize_line_endings(&content), file, root, scan_config)
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Render one markdown file against the document.
pub fn transform_file(path: &Path, doc: &CanonicalDocument) -> DoctagResult<String> {
	let content = std::fs::read_to_string(path)?;
	evaluate_dsl(&normalize_line_endings(&content), doc)
}

/// A rendered file waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedFile {
	pub source: PathBuf,
	pub destination: PathBuf,
	pub content: String,
}

/// A file whose template failed to render.
#[derive(Debug)]
pub struct TransformFailure {
	pub source: PathBuf,
	pub error: DoctagError,
}

/// The outcome of rendering a batch of markdown files. Nothing is written
/// until [`write_transforms`] is called.
#[derive(Debug, Default)]
pub struct TransformReport {
	pub written: Vec<TransformedFile>,
	pub failures: Vec<TransformFailure>,
}

impl TransformReport {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}
}

/// `README.md` becomes `README.generated.md`.
pub fn generated_path(path: &Path) -> PathBuf {
	let stem = path
		.file_stem()
		.map(|stem| stem.to_string_lossy().to_string())
		.unwrap_or_default();
	let name = match path.extension() {
		Some(ext) => format!("{stem}.generated.{}", ext.to_string_lossy()),
		None => format!("{stem}.generated"),
	};

	path.with_file_name(name)
}

/// Pair each template with the path its output goes to.
///
/// With `transform.entry` and `transform.output` configured, files under
/// `entry` are mirrored into `output`, and with no `inputs` every markdown
/// file under `entry` is used. Any other input is written beside itself as
/// `<name>.generated.<ext>`.
pub fn plan_transform(
	root: &Path,
	config: &DoctagConfig,
	inputs: &[PathBuf],
) -> DoctagResult<Vec<(PathBuf, PathBuf)>> {
	let directories = config
		.transform
		.directories()
		.map(|(entry, output)| (root.join(entry), root.join(output)));

	let sources: Vec<PathBuf> = if !inputs.is_empty() {
		inputs
			.iter()
			.map(|input| {
				if input.is_absolute() {
					input.clone()
				} else {
					root.join(input)
				}
			})
			.collect()
	} else if let Some((entry, _)) = &directories {
		collect_markdown_files(entry)?
	} else {
		warn!("no input files and no `transform.entry` configured, nothing to transform");
		Vec::new()
	};

	let plan = sources
		.into_iter()
		.map(|source| {
			let mirrored = directories.as_ref().and_then(|(entry, output)| {
				source
					.strip_prefix(entry)
					.ok()
					.map(|relative| output.join(relative))
			});
			let destination = mirrored.unwrap_or_else(|| generated_path(&source));
			(source, destination)
		})
		.collect();

	Ok(plan)
}

/// Render every planned template. A failing file is recorded in the report
/// and does not stop the others.
pub fn transform_workspace(
	root: &Path,
	config: &DoctagConfig,
	doc: &CanonicalDocument,
	inputs: &[PathBuf],
) -> DoctagResult<TransformReport> {
	let mut report = TransformReport::default();

	for (source, destination) in plan_transform(root, config, inputs)? {
		match transform_file(&source, doc) {
			Ok(content) => {
				debug!(
					source = %source.display(),
					destination = %destination.display(),
					"rendered template"
				);
				report.written.push(TransformedFile {
					source,
					destination,
					content,
				});
			}
			Err(error) => {
				warn!(source = %source.display(), %error, "failed to render template");
				report.failures.push(TransformFailure { source, error });
			}
		}
	}

	Ok(report)
}

/// Write the rendered files to disk, creating parent directories.
pub fn write_transforms(report: &TransformReport) -> DoctagResult<()> {
	for file in &report.written {
		if let Some(parent) = file.destination.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&file.destination, &file.content)?;
	}

	Ok(())
}

/// Build a `GlobSet` from a list of glob pattern strings.
fn build_glob_set(patterns: &[String]) -> DoctagResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			DoctagError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
		builder.add(glob);
	}

	builder.build().map_err(|e| {
		DoctagError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Build a `Gitignore` matcher from the `exclude` patterns. These follow
/// `.gitignore` syntax and are applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> DoctagResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			DoctagError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}

	builder.build().map_err(|e| {
		DoctagError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Build a `Gitignore` matcher from the workspace's `.gitignore` file (if
/// any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(error) = builder.add(&gitignore_path) {
			warn!(path = %gitignore_path.display(), %error, "ignoring unreadable .gitignore");
		}
	}

	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn is_markdown_file(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "md" | "mdx" | "markdown"))
}

/// Files found by a walk.
#[derive(Debug, Default)]
pub struct CollectedFiles {
	/// Sorted file paths.
	pub files: Vec<PathBuf>,
	/// Directories below the walk root that couldn't be listed. Their
	/// contents are missing from `files`.
	pub unreadable: Vec<(PathBuf, DoctagError)>,
}

/// Directory walker shared by the scan and the transform discovery.
struct Walker<'a> {
	root: &'a Path,
	gitignore: Gitignore,
	exclude: Gitignore,
	include: GlobSet,
	accept: &'a dyn Fn(&Path) -> bool,
}

impl Walker<'_> {
	fn walk(&self, dir: &Path, found: &mut CollectedFiles, visited: &mut HashSet<PathBuf>) {
		if !dir.is_dir() {
			return;
		}

		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited.insert(canonical) {
			debug!(dir = %dir.display(), "skipping directory that was already visited");
			return;
		}

		let entries = match std::fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(error) => {
				warn!(dir = %dir.display(), %error, "skipping unreadable directory");
				found.unreadable.push((dir.to_path_buf(), error.into()));
				return;
			}
		};

		for entry in entries {
			let path = match entry {
				Ok(entry) => entry.path(),
				Err(error) => {
					warn!(dir = %dir.display(), %error, "skipping unreadable directory entry");
					found.unreadable.push((dir.to_path_buf(), error.into()));
					continue;
				}
			};

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) {
					continue;
				}
			}

			let is_dir = path.is_dir();

			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				self.walk(&path, found, visited);
				continue;
			}

			let included = path
				.strip_prefix(self.root)
				.is_ok_and(|relative| self.include.is_match(relative));

			if included || (self.accept)(&path) {
				found.files.push(path);
			}
		}
	}

	/// Walk `dir`. Failing to list `dir` itself is an error; deeper failures
	/// are collected.
	fn collect(&self, dir: &Path) -> DoctagResult<CollectedFiles> {
		let mut found = CollectedFiles::default();
		let mut visited = HashSet::new();
		self.walk(dir, &mut found, &mut visited);

		if found.unreadable.first().is_some_and(|(path, _)| path == dir) {
			let (_, error) = found.unreadable.remove(0);
			return Err(error);
		}

		found.files.sort();
		Ok(found)
	}
}

/// Collect every file the scan should read.
///
/// By default that is every file whose extension has a registered comment
/// style, markdown excluded. Files matching `include` are added whatever
/// their extension. `.gitignore` (unless disabled) and `exclude` apply to
/// both.
pub fn collect_source_files(
	root: &Path,
	config: &DoctagConfig,
	scan_config: &ScanConfig,
) -> DoctagResult<CollectedFiles> {
	let accept = |path: &Path| {
		!is_markdown_file(path)
			&& path
				.extension()
				.and_then(|ext| ext.to_str())
				.is_some_and(|ext| scan_config.styles.knows_extension(ext))
	};
	let walker = Walker {
		root,
		gitignore: if config.disable_gitignore {
			Gitignore::empty()
		} else {
			build_gitignore(root)
		},
		exclude: build_exclude_matcher(root, &config.exclude)?,
		include: build_glob_set(&config.include)?,
		accept: &accept,
	};

	walker.collect(root)
}

/// Collect the markdown files under `dir`, skipping generated output.
fn collect_markdown_files(dir: &Path) -> DoctagResult<Vec<PathBuf>> {
	let accept = |path: &Path| {
		is_markdown_file(path)
			&& !path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.contains(".generated."))
	};
	let walker = Walker {
		root: dir,
		gitignore: Gitignore::empty(),
		exclude: Gitignore::empty(),
		include: GlobSet::empty(),
		accept: &accept,
	};

	Ok(walker.collect(dir)?.files)
}
