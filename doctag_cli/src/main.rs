use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use clap::Parser;
use doctag_cli::Commands;
use doctag_cli::DoctagCli;
use doctag_cli::OutputFormat;
use doctag_core::CONFIG_FILE_CANDIDATES;
use doctag_core::CanonicalDocument;
use doctag_core::DoctagConfig;
use doctag_core::SAMPLE_CONFIG;
use doctag_core::ScanResult;
use doctag_core::project::scan_workspace;
use doctag_core::project::transform_workspace;
use doctag_core::project::write_transforms;
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static USE_COLOR: AtomicBool = AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// How a command finished when it didn't hit a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
	Success,
	/// Some files were skipped or failed to render.
	Partial,
}

fn main() {
	let args = DoctagCli::parse();

	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Scan { out }) => run_scan(&args, out.as_deref()),
		Some(Commands::Transform {
			files,
			doc,
			dry_run,
		}) => run_transform(&args, files, doc.as_deref(), *dry_run),
		Some(Commands::List { doc, format }) => run_list(&args, doc.as_deref(), *format),
		None => {
			eprintln!("No subcommand specified. Run `doctag --help` for usage.");
			process::exit(2);
		}
	};

	match result {
		Ok(Outcome::Success) => {}
		Ok(Outcome::Partial) => process::exit(1),
		Err(e) => {
			match e.downcast::<doctag_core::DoctagError>() {
				Ok(doctag_err) => {
					let report: miette::Report = (*doctag_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr. `RUST_LOG` wins; otherwise `warn`, or `debug` with
/// `--verbose`.
fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &DoctagCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Resolve `path` against the project root unless it's absolute.
fn resolve_in(root: &Path, path: &Path) -> PathBuf {
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		root.join(path)
	}
}

fn run_init(args: &DoctagCli) -> CliResult<Outcome> {
	let root = resolve_root(args);

	if let Some(existing) = DoctagConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(Outcome::Success);
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created config file: {}", config_path.display());

	println!();
	println!("Next steps:");
	println!("  1. Annotate your source comments:");
	println!("     /// @doc add Add");
	println!("     /// @param a i32 First number");
	println!("  2. Run `doctag scan` to write the canonical document");
	println!("  3. Reference it from markdown:");
	println!("     {{{{ @doc.add:get('param', 0, 0, 1) }}}}");
	println!("  4. Run `doctag transform README.md` to render it");

	Ok(Outcome::Success)
}

/// Scan the workspace and print every skipped file.
fn scan_and_report(args: &DoctagCli, root: &Path, config: &DoctagConfig) -> CliResult<ScanResult> {
	let result = scan_workspace(root, config)?;

	if args.verbose {
		println!(
			"Scanned {} file(s), found {} block(s)",
			result.files_scanned,
			result.document.len()
		);
	}

	for diagnostic in &result.diagnostics {
		let location = match diagnostic.line {
			Some(line) => format!("{}:{line}", diagnostic.file),
			None => diagnostic.file.clone(),
		};
		eprintln!(
			"{} skipped {location}: {}",
			colored!("warning:", yellow),
			diagnostic.message
		);
	}

	Ok(result)
}

/// The document to render or list: read from `doc` when given, otherwise
/// scanned fresh.
fn load_document(
	args: &DoctagCli,
	root: &Path,
	config: &DoctagConfig,
	doc: Option<&Path>,
) -> CliResult<(CanonicalDocument, Outcome)> {
	if let Some(doc) = doc {
		let path = resolve_in(root, doc);
		debug!(path = %path.display(), "reading canonical document");
		return Ok((CanonicalDocument::read(&path)?, Outcome::Success));
	}

	let result = scan_and_report(args, root, config)?;
	let outcome = if result.is_clean() {
		Outcome::Success
	} else {
		Outcome::Partial
	};

	Ok((result.document, outcome))
}

fn run_scan(args: &DoctagCli, out: Option<&Path>) -> CliResult<Outcome> {
	let root = resolve_root(args);
	let config = DoctagConfig::load_or_default(&root)?;
	let result = scan_and_report(args, &root, &config)?;

	let out = out.map_or_else(|| config.canonical_path(&root), |out| resolve_in(&root, out));
	result.document.write(&out)?;

	println!(
		"{} {} block(s) from {} file(s) to {}",
		colored!("Wrote", green),
		result.document.len(),
		result.files_scanned,
		make_relative(&out, &root)
	);

	if result.is_clean() {
		Ok(Outcome::Success)
	} else {
		eprintln!(
			"{} file(s) skipped. Fix the errors above and scan again.",
			result.diagnostics.len()
		);
		Ok(Outcome::Partial)
	}
}

fn run_transform(
	args: &DoctagCli,
	files: &[PathBuf],
	doc: Option<&Path>,
	dry_run: bool,
) -> CliResult<Outcome> {
	let root = resolve_root(args);
	let config = DoctagConfig::load_or_default(&root)?;
	let (document, scan_outcome) = load_document(args, &root, &config, doc)?;
	let report = transform_workspace(&root, &config, &document, files)?;

	for failure in &report.failures {
		eprintln!(
			"{} {}: {}",
			colored!("error:", red),
			make_relative(&failure.source, &root),
			failure.error
		);
	}

	if report.written.is_empty() && report.is_ok() {
		println!("No templates to transform.");
		return Ok(scan_outcome);
	}

	if dry_run {
		println!("Dry run: would write {} file(s):", report.written.len());
		for file in &report.written {
			println!(
				"  {} -> {}",
				make_relative(&file.source, &root),
				make_relative(&file.destination, &root)
			);
		}
	} else {
		write_transforms(&report)?;
		println!("Transformed {} file(s).", report.written.len());

		if args.verbose {
			for file in &report.written {
				println!("  {}", make_relative(&file.destination, &root));
			}
		}
	}

	if report.is_ok() {
		Ok(scan_outcome)
	} else {
		eprintln!("{} template(s) failed to render.", report.failures.len());
		Ok(Outcome::Partial)
	}
}

fn run_list(args: &DoctagCli, doc: Option<&Path>, format: OutputFormat) -> CliResult<Outcome> {
	let root = resolve_root(args);
	let config = DoctagConfig::load_or_default(&root)?;
	let (document, outcome) = load_document(args, &root, &config, doc)?;

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = document
				.iter()
				.map(|(key, block)| {
					serde_json::json!({
						"key": key,
						"label": block.label,
						"path": block.meta.path,
						"line": block.meta.line,
						"tags": block.tags.keys().collect::<Vec<_>>(),
					})
				})
				.collect();
			println!("{}", serde_json::Value::Array(entries));
		}
		OutputFormat::Text => {
			if document.is_empty() {
				println!("No documented blocks found.");
				return Ok(outcome);
			}

			println!("{}", colored!("Blocks:", bold));
			for (key, block) in document.iter() {
				let tags: Vec<&str> = block.tags.keys().map(String::as_str).collect();
				println!(
					"  {key} \"{}\" {} [{}]",
					block.label,
					block.meta.location(),
					tags.join(", ")
				);
			}
			println!("\n{} block(s)", document.len());
		}
	}

	Ok(outcome)
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
