// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[test]
fn parses_the_node_command_line() {
    let (alias, config, verbose) = parse(argv(&["generation", "-c", "gen_j0.task.json"])).unwrap();
    assert_eq!(alias, "generation");
    assert_eq!(config, PathBuf::from("gen_j0.task.json"));
    assert!(!verbose);
}

#[test]
fn parses_verbose_and_long_flags() {
    let (_, config, verbose) =
        parse(argv(&["run", "--config", "./c.json", "-v"])).unwrap();
    assert_eq!(config, PathBuf::from("./c.json"));
    assert!(verbose);
}

#[test]
fn config_is_required() {
    assert!(parse(argv(&["run"])).is_err());
    assert!(parse(argv(&["run", "-c"])).is_err());
}

#[test]
fn unexpected_arguments_are_rejected() {
    assert!(parse(argv(&["run", "--frobnicate"])).is_err());
}

#[test]
fn alias_resolves_through_the_pipeline_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config_pipeline.json"),
        r#"{"pipeline": [{"preprocess": "./config_prep.json", "command": "script"}]}"#,
    )
    .unwrap();

    let registry = swath_engine::builtin_registry();
    // direct command name
    assert_eq!(resolve_command("script", &registry, dir.path()).unwrap(), "script");
    // alias mapped by the pipeline config
    assert_eq!(
        resolve_command("preprocess", &registry, dir.path()).unwrap(),
        "script"
    );
    // unknown everywhere
    assert!(resolve_command("nope", &registry, dir.path()).is_err());
}
