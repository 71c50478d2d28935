#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;

pub fn doctag_cmd() -> Command {
	let mut cmd = Command::cargo_bin("doctag").unwrap_or_else(|e| panic!("doctag binary: {e}"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

pub const ADD_RS: &str = "/// @doc add Add\n/// @description Sums two numbers\n/// @param a int \
                          First\n/// @param b int Second\n/// @returns int The sum\nfn add(a: i32, \
                          b: i32) -> i32 {\n\ta + b\n}\n";
