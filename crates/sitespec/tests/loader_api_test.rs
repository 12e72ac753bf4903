//! Integration tests for the SpecLoader API

use std::fs;

use tempfile::tempdir;

use sitespec::{
    SiteSpecError, SpecLoader,
    config::{AppConfig, OutputConfig, OutputFormat, ParserConfig},
    semantic::RequestType,
};

const SITE: &str = r#"
type LoginRequest {
    Email string `form:"email"`
}

@server (
    prefix: /auth
)
service web {
    @handler login
    post /login (LoginRequest)
}
"#;

#[test]
fn test_parse_str() {
    let loader = SpecLoader::default();

    let spec = loader.parse_str("site", SITE).expect("Failed to parse");

    assert_eq!(spec.name(), "site");
    let method = spec.methods().next().expect("one method");
    assert_eq!(method.classify(), RequestType::FormSubmission);
}

#[test]
fn test_load_with_imports() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("types.api"), "type Profile { Name string }\n")
        .expect("Failed to write");
    let root = dir.path().join("app.api");
    fs::write(&root, format!("import \"types.api\"\n{SITE}")).expect("Failed to write");

    let loader = SpecLoader::default();
    let spec = loader.load(&root).expect("Failed to load");
    let ast = loader.load_ast(&root).expect("Failed to load AST");

    assert_eq!(spec.name(), "app");
    assert!(spec.find_type("Profile").is_some());
    assert_eq!(ast.structs.len(), 2);
}

#[test]
fn test_parse_error_keeps_source() {
    let loader = SpecLoader::default();

    let err = loader
        .parse_str("broken", "@module (\nname: x\n)\n")
        .expect_err("module block is incomplete");

    match err {
        SiteSpecError::Parse { err, src } => {
            assert_eq!(err.diagnostics().len(), 1);
            assert!(src.starts_with("@module ("));
        }
        other => panic!("Expected parse error, got {other:?}"),
    }
}

#[test]
fn test_missing_root_file() {
    let dir = tempdir().expect("Failed to create temp dir");

    let result = SpecLoader::default().load(dir.path().join("absent.api"));

    assert!(matches!(result, Err(SiteSpecError::Parse { .. })));
}

#[test]
fn test_strict_config() {
    let text = format!("import \"shared.api\"\n{SITE}");
    let strict = SpecLoader::new(AppConfig::new(
        ParserConfig::new(true),
        OutputConfig::default(),
    ));

    assert!(SpecLoader::default().parse_str("site", &text).is_ok());
    assert!(strict.parse_str("site", &text).is_err());
}

#[test]
fn test_render_formats() {
    let json_loader = SpecLoader::new(AppConfig::default().with_format(OutputFormat::Json));
    let spec = json_loader.parse_str("site", SITE).expect("Failed to parse");

    let json = json_loader.render(&spec).expect("Failed to render");
    let text = SpecLoader::default().render(&spec).expect("Failed to render");

    assert!(json.trim_start().starts_with('{'));
    assert!(text.starts_with("site site\n"));
    assert!(text.contains("POST /auth/login -> form_submission"));
}
