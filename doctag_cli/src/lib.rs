use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Extract documentation tags from source comments and render them into markdown.",
	long_about = "doctag reads `@tag` annotations from source comments in many languages, \
	              collects them into a canonical JSON document keyed by `doc.<key>` and \
	              renders markdown templates that reference that document.\n\nQuick start:\n  \
	              doctag init       Create a doctag.json config\n  doctag scan       Write the \
	              canonical document\n  doctag list       Show the documented keys\n  doctag \
	              transform  Render markdown templates"
)]
pub struct DoctagCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output and debug logging.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `doctag.json` in the project root.
	///
	/// Does nothing when a config file is already present.
	Init,
	/// Scan source files and write the canonical document.
	///
	/// Every file with a known comment syntax is read, its `@doc` blocks are
	/// collected, and the result is written as JSON to `canonicalPath` (or
	/// `--out`). Files that fail are reported and skipped. Exits with status 1
	/// when any file was skipped.
	Scan {
		/// Where to write the canonical document. Defaults to the configured
		/// `canonicalPath`.
		#[arg(long, short)]
		out: Option<PathBuf>,
	},
	/// Render markdown templates against the canonical document.
	///
	/// Each `{{ @doc.key:method(...) }}` expression is replaced with its value
	/// and `{{ @if ... }}` / `{{ @end }}` sections are kept or removed. With
	/// no files, every markdown file under `transform.entry` is rendered into
	/// `transform.output`.
	Transform {
		/// Markdown files to render.
		files: Vec<PathBuf>,

		/// Read the canonical document from this file instead of scanning.
		#[arg(long)]
		doc: Option<PathBuf>,

		/// Print which files would be written without touching the disk.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// List every documented key with its label and location.
	List {
		/// Read the canonical document from this file instead of scanning.
		#[arg(long)]
		doc: Option<PathBuf>,

		/// Output format for the listing.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
