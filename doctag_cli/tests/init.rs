mod common;

use doctag_core::AnyEmptyResult;
use doctag_core::DoctagConfig;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::doctag_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created config file"))
		.stdout(predicates::str::contains("doctag scan"));

	let config_path = tmp.path().join("doctag.json");
	assert!(config_path.exists());
	assert_eq!(
		DoctagConfig::from_path(&config_path)?,
		DoctagConfig::default()
	);

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join(".doctag.json");
	std::fs::write(&config_path, "{ \"initTag\": \"api\" }")?;

	common::doctag_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	assert_eq!(
		std::fs::read_to_string(&config_path)?,
		"{ \"initTag\": \"api\" }"
	);
	assert!(!tmp.path().join("doctag.json").exists());

	Ok(())
}

#[test]
fn missing_subcommand_is_an_error() {
	common::doctag_cmd()
		.assert()
		.code(2)
		.stderr(predicates::str::contains("No subcommand specified"));
}
