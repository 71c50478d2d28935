mod common;

use doctag_core::AnyEmptyResult;
use serde_json::Value;

#[test]
fn list_prints_keys_labels_and_locations() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);
	common::write(
		tmp.path(),
		"tools/area.py",
		"\n# @doc area Rectangle area\n# @param w float Width\n",
	);

	common::doctag_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"doc.add \"Add\" src/lib.rs:1 [description, param, returns]",
		))
		.stdout(predicates::str::contains(
			"doc.area \"Rectangle area\" tools/area.py:2 [param]",
		))
		.stdout(predicates::str::contains("2 block(s)"));

	Ok(())
}

#[test]
fn list_as_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);

	let output = common::doctag_cmd()
		.args(["list", "--format", "json", "--path"])
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json[0]["key"], "doc.add");
	assert_eq!(json[0]["label"], "Add");
	assert_eq!(json[0]["line"], 1);
	assert_eq!(json[0]["tags"][1], "param");

	Ok(())
}

#[test]
fn list_empty_project() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::doctag_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No documented blocks found."));

	Ok(())
}

#[test]
fn list_reports_unreadable_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "doc.json", "[]");

	common::doctag_cmd()
		.args(["list", "--doc", "doc.json", "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("doctag::canonical_json"));

	Ok(())
}
