use std::fs;

use figure::{
    Compiler, FigureError, Value,
    config::{AppConfig, CompileSettings, OutputConfig},
};
use figure_parser::ErrorCode;

fn compile_error_code(err: FigureError) -> Option<ErrorCode> {
    match err {
        FigureError::Compile { err, .. } => err.diagnostics()[0].code(),
        other => panic!("Expected compile error, got {other:?}"),
    }
}

#[test]
fn test_compile_file_with_relative_includes() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("shared")).unwrap();
    fs::write(
        dir.path().join("main.fig"),
        r#"
            name: "app"
            #include "shared/db.fig"
            [server]
            port: 8080
        "#,
    )
    .unwrap();
    // Relative to `shared/`, not to the entry file
    fs::write(
        dir.path().join("shared/db.fig"),
        r#"#include "defaults.fig" db.host: "localhost""#,
    )
    .unwrap();
    fs::write(dir.path().join("shared/defaults.fig"), "db.port: 5432").unwrap();

    let compiler = Compiler::default();
    let tree = compiler
        .compile_file(dir.path().join("main.fig"))
        .expect("Failed to compile");

    let keys: Vec<_> = tree.keys().collect();
    assert_eq!(keys, ["name", "db", "server"]);
    assert_eq!(tree.get_path("db.port").and_then(Value::as_integer), Some(5432));
    assert_eq!(
        tree.get_path("db.host").and_then(Value::as_str),
        Some("localhost")
    );
}

#[test]
fn test_compile_file_include_cycle() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.fig"), r#"#include "sub/b.fig""#).unwrap();
    fs::write(dir.path().join("sub/b.fig"), r#"#include "../a.fig""#).unwrap();

    let err = Compiler::default()
        .compile_file(dir.path().join("a.fig"))
        .unwrap_err();

    assert_eq!(compile_error_code(err), Some(ErrorCode::E201));
}

#[test]
fn test_compile_error_keeps_included_sources() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.fig"), r#"#include "bad.fig""#).unwrap();
    fs::write(dir.path().join("bad.fig"), "x: undefined").unwrap();

    let err = Compiler::default()
        .compile_file(dir.path().join("main.fig"))
        .unwrap_err();

    let FigureError::Compile { err, sources } = err else {
        panic!("Expected compile error");
    };
    let span = err.diagnostics()[0]
        .primary_span()
        .expect("Diagnostic should have a span");
    assert!(sources.describe(span).ends_with("bad.fig:1:4"));
}

#[test]
fn test_missing_entry_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = Compiler::default()
        .compile_file(dir.path().join("nope.fig"))
        .unwrap_err();

    assert!(matches!(err, FigureError::Io(_)));
}

#[test]
fn test_expansion_limit_from_config() {
    let config = AppConfig::new(CompileSettings::new(64, 2), OutputConfig::default());
    let compiler = Compiler::new(config);

    let err = compiler
        .compile_str("[%{a,b,c}] x: 1", "limits.fig")
        .unwrap_err();

    assert_eq!(compile_error_code(err), Some(ErrorCode::E300));
}

#[test]
fn test_json_output_modes() {
    let tree = Compiler::default()
        .compile_str("a: {b: [1, 2]}", "inline.fig")
        .unwrap();

    let compact = Compiler::new(AppConfig::default().with_output(OutputConfig::new(false)));
    assert_eq!(compact.to_json(&tree).unwrap(), r#"{"a":{"b":[1,2]}}"#);

    let pretty = Compiler::default().to_json(&tree).unwrap();
    assert!(pretty.contains('\n'));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&pretty).unwrap(),
        serde_json::json!({"a": {"b": [1, 2]}})
    );
}

#[test]
fn test_config_from_toml() {
    let config: AppConfig = toml::from_str(
        r#"
            [compile]
            max_expansions = 10
            max_nesting_depth = 16

            [output]
            pretty = false
        "#,
    )
    .unwrap();

    assert_eq!(config.compile().max_expansions(), 10);
    assert_eq!(config.compile().max_include_depth(), 64);
    assert_eq!(config.compile().max_nesting_depth(), 16);
    assert!(!config.output().pretty());
}

#[test]
fn test_nesting_limit_from_config() {
    let settings = CompileSettings::default().with_max_nesting_depth(4);
    let compiler = Compiler::new(AppConfig::new(settings, OutputConfig::default()));

    let err = compiler
        .compile_str("a: {b: {c: {d: {e: {f: 1}}}}}", "deep.fig")
        .unwrap_err();
    assert_eq!(compile_error_code(err), Some(ErrorCode::E103));

    let tree = compiler.compile_str("a: {b: {c: 1}}", "shallow.fig").unwrap();
    assert_eq!(tree.get_path("a.b.c").and_then(Value::as_integer), Some(1));
}
