mod common;

use doctag_core::AnyEmptyResult;

#[test]
fn transform_writes_generated_file_beside_input() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);
	common::write(
		tmp.path(),
		"README.md",
		"# {{ @doc.add:meta('key') }}\n\n{{ @doc.add:get('description') }}\n\n{{ \
		 @doc.add:each('param', '- `{1}`: {0,1}') }}\n",
	);

	common::doctag_cmd()
		.args(["transform", "README.md", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Transformed 1 file(s)."));

	let rendered = std::fs::read_to_string(tmp.path().join("README.generated.md"))?;
	assert_eq!(
		rendered,
		"# add\n\nSums two numbers\n\n- `a`: int\n- `b`: int\n"
	);

	Ok(())
}

#[test]
fn transform_removes_false_conditional_sections() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);
	common::write(
		tmp.path(),
		"README.md",
		"Intro\n{{ @if doc.add:has('example') }}\n## Example\n{{ @end }}\n{{ @if \
		 doc.add:has('returns') }}\nReturns {{ @doc.add:get('returns') }}\n{{ @end }}\n",
	);

	common::doctag_cmd()
		.args(["transform", "README.md", "--path"])
		.arg(tmp.path())
		.assert()
		.success();

	let rendered = std::fs::read_to_string(tmp.path().join("README.generated.md"))?;
	assert_eq!(rendered, "Intro\nReturns int\n");

	Ok(())
}

#[test]
fn transform_dry_run_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);
	common::write(tmp.path(), "README.md", "{{ @doc.add:count('param') }}\n");

	common::doctag_cmd()
		.args(["transform", "README.md", "--dry-run", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Dry run: would write 1 file(s):"))
		.stdout(predicates::str::contains("README.md -> README.generated.md"));

	assert!(!tmp.path().join("README.generated.md").exists());

	Ok(())
}

#[test]
fn transform_mirrors_entry_into_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);
	common::write(
		tmp.path(),
		"doctag.json",
		r#"{ "transform": { "entry": "templates", "output": "docs" } }"#,
	);
	common::write(
		tmp.path(),
		"templates/api/add.md",
		"{{ @doc.add:meta('path') }}\n",
	);

	common::doctag_cmd()
		.arg("transform")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let rendered = std::fs::read_to_string(tmp.path().join("docs/api/add.md"))?;
	assert_eq!(rendered, "src/lib.rs\n");

	Ok(())
}

#[test]
fn transform_reads_document_from_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);

	common::doctag_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	std::fs::remove_file(tmp.path().join("src/lib.rs"))?;
	common::write(tmp.path(), "README.md", "{{ @doc.add:get('param', 1, 0, 0, 1) }}\n");

	common::doctag_cmd()
		.args([
			"transform",
			"README.md",
			"--doc",
			"doctag.canonical.json",
			"--path",
		])
		.arg(tmp.path())
		.assert()
		.success();

	let rendered = std::fs::read_to_string(tmp.path().join("README.generated.md"))?;
	assert_eq!(rendered, "Second\n");

	Ok(())
}

#[test]
fn transform_failure_exits_with_one_and_keeps_other_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);
	common::write(tmp.path(), "bad.md", "{{ @doc.missing:count('param') }}\n");
	common::write(tmp.path(), "good.md", "{{ @doc.add:count('param') }}\n");

	common::doctag_cmd()
		.args(["transform", "bad.md", "good.md", "--path"])
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("bad.md"))
		.stderr(predicates::str::contains("no documented block found for `doc.missing`"));

	assert!(!tmp.path().join("bad.generated.md").exists());
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("good.generated.md"))?,
		"2\n"
	);

	Ok(())
}

#[test]
fn transform_without_templates_reports_nothing_to_do() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "src/lib.rs", common::ADD_RS);

	common::doctag_cmd()
		.arg("transform")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No templates to transform."));

	Ok(())
}
