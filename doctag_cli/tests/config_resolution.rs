mod common;

use doctag_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn scan_resolves_dot_config_doctag_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), ".config/doctag.toml", "initTag = \"api\"\n");
	common::write(tmp.path(), "src/lib.rs", "/// @api add Add\n/// @doc ignored\n");

	common::doctag_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("doc.add \"Add\""))
		.stdout(predicates::str::contains("1 block(s)"));

	Ok(())
}

#[test]
fn scan_prefers_doctag_json_over_other_candidates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "doctag.json", r#"{ "initTag": "api" }"#);
	common::write(tmp.path(), "doctag.toml", "initTag = \"other\"\n");
	common::write(tmp.path(), "src/lib.rs", "/// @api add Add\n/// @other sub Sub\n");

	common::doctag_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("doc.add"))
		.stdout(predicates::str::contains("doc.sub").not());

	Ok(())
}

#[test]
fn comment_pattern_overrides_reach_the_scan() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"doctag.json",
		r#"{ "include": ["notes/*.txt"], "commentPatterns": { "txt": { "single": [";"] } } }"#,
	);
	common::write(tmp.path(), "notes/todo.txt", "; @doc todo Todo list\n");

	common::doctag_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("doc.todo \"Todo list\" notes/todo.txt:1"));

	Ok(())
}
