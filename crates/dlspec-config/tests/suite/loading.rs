use dlspec::CompilationKind;
use dlspec_config::{CompilationSetting, ConfigError, DlspecConfig};
use pretty_assertions::assert_eq;

#[test]
fn full_config_round_trips_through_toml() {
    let text = r#"
[logging]
level = "dlspec.parser=debug,info"
json = true
stderr = false
file = "/tmp/dlspec.log"

[specification]
min_api_level = 21
compilation = "library"
pretty = true
"#;
    let config = DlspecConfig::load_from_str(text).unwrap();
    assert_eq!(config.logging.level, "dlspec.parser=debug,info");
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
    assert_eq!(
        config.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/dlspec.log"))
    );
    assert_eq!(config.specification.min_api_level, 21);
    assert_eq!(config.specification.compilation, CompilationSetting::Library);
    assert_eq!(
        config.specification.compilation_kind(),
        CompilationKind::Library
    );
    assert!(config.specification.pretty);

    let rendered = toml::to_string(&config).unwrap();
    assert_eq!(DlspecConfig::load_from_str(&rendered).unwrap(), config);
}

#[test]
fn unknown_keys_are_rejected() {
    for text in [
        "[logging]\nverbose = true\n",
        "[specification]\nmax_api_level = 30\n",
        "[extras]\n",
    ] {
        let err = DlspecConfig::load_from_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{text}: {err}");
    }
}

#[test]
fn unknown_compilation_kind_is_rejected() {
    let err = DlspecConfig::load_from_str("[specification]\ncompilation = \"both\"\n").unwrap_err();
    assert!(err.to_string().contains("unknown variant"), "{err}");
}

#[test]
fn unreadable_path_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DlspecConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}
