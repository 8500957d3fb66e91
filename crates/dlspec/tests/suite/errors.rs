use dlspec::{
    parse, parse_multi_api_level, parse_path, CompilationKind, Origin, SpecificationError,
    SymbolTable,
};
use serde_json::Value;

use super::{document, document_with, FIXTURE};

fn parse_program(text: &str) -> Result<dlspec::MachineSpecification, SpecificationError> {
    let mut table = SymbolTable::new();
    parse(
        &mut table,
        text,
        Origin::named("broken.json"),
        19,
        CompilationKind::Program,
    )
}

fn fixture_with(edit: impl FnOnce(&mut serde_json::Map<String, Value>)) -> String {
    let mut value: Value = serde_json::from_str(FIXTURE).unwrap();
    edit(value.as_object_mut().unwrap());
    value.to_string()
}

#[test]
fn unsupported_version_is_rejected() {
    let text = fixture_with(|root| {
        root.insert("configuration_format_version".into(), 199.into());
    });
    let err = parse_program(&text).unwrap_err();
    assert!(matches!(
        err,
        SpecificationError::UnsupportedVersion { version: 199, min: 200, max: 200, .. }
    ));
    assert_eq!(
        err.to_string(),
        "broken.json: Unsupported machine version number 199 not in [200,200]"
    );
}

#[test]
fn missing_required_keys_are_named() {
    for key in [
        "configuration_format_version",
        "identifier",
        "shrinker_config",
        "package_map",
        "program_flags",
    ] {
        let text = fixture_with(|root| {
            root.remove(key);
        });
        let err = parse_program(&text).unwrap_err();
        assert!(
            matches!(err, SpecificationError::MissingKey { key: ref missing, .. } if missing == key),
            "{key}: {err}"
        );
    }

    let err = parse_program(&document(r#"{"rewrite_type": {}}"#)).unwrap_err();
    assert!(err
        .to_string()
        .contains("Expected required key 'api_level_below_or_equal'"));
}

#[test]
fn wrong_value_types_are_rejected() {
    let err = parse_program(&document(
        r#"{"api_level_below_or_equal": 23, "rewrite_type": ["a$Optional"]}"#,
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        SpecificationError::UnexpectedValue { ref context, expected: "a JSON object", .. }
            if context == "rewrite_type"
    ));

    let err = parse_program(&document(r#"{"api_level_below_or_equal": -1}"#)).unwrap_err();
    assert!(matches!(err, SpecificationError::UnexpectedValue { .. }));
}

#[test]
fn malformed_json_is_reported() {
    let err = parse_program("{\"configuration_format_version\": 200,").unwrap_err();
    assert!(matches!(err, SpecificationError::Json { .. }));
    assert!(err.to_string().starts_with("broken.json: "));
}

#[test]
fn wrong_arity_names_the_descriptor() {
    let err = parse_program(&document(
        r#"{
            "api_level_below_or_equal": 23,
            "wrapper": {"a$function$Consumer": [["void a$function$Consumer#accept(c$Object)"], false]}
        }"#,
    ))
    .unwrap_err();
    assert!(err
        .to_string()
        .ends_with("Invalid desugared library specification: wrapper descriptor (array of size 2)"));

    let err = parse_program(&document(
        r#"{
            "api_level_below_or_equal": 23,
            "emulated_virtual_retarget": {
                "void a$Map#forEach(a$function$BiConsumer)": [
                    ["void b$Map#forEach(a$function$BiConsumer)", -1, 3],
                    ["void a$Map#forEach(a$Map, a$function$BiConsumer)", 11],
                    ["void a$Map#forEach(a$Map, a$function$BiConsumer)", 10],
                    {}
                ]
            }
        }"#,
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        SpecificationError::ArraySize { description: "derived method", size: 3, .. }
    ));
}

#[test]
fn missing_package_token_is_fatal() {
    let err = parse_program(&document(
        r#"{"api_level_below_or_equal": 23, "maintain_type": ["z$Missing"]}"#,
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        SpecificationError::MissingPackageMapping { ref token, .. } if token == "z$"
    ));
}

#[test]
fn package_map_must_be_a_bijection() {
    let text = document_with(r#"{"a$": "java.util", "java.time": "a$"}"#, "", "", "");
    let err = parse_program(&text).unwrap_err();
    assert!(matches!(err, SpecificationError::PackageMapNotBijective { .. }));

    let text = document_with(r#"{"java.util": "java.time"}"#, "", "", "");
    let err = parse_program(&text).unwrap_err();
    assert!(matches!(err, SpecificationError::UnexpectedValue { .. }));
}

#[test]
fn malformed_symbols_are_reported() {
    let err = parse_program(&document(
        r#"{"api_level_below_or_equal": 23, "static_retarget": {"a$Math#floorMod": "a$Math#floorMod"}}"#,
    ))
    .unwrap_err();
    assert!(matches!(err, SpecificationError::MalformedSymbol { .. }));
}

#[test]
fn custom_conversions_must_be_inverse() {
    let err = parse_program(&document(
        r#"{
            "api_level_below_or_equal": 23,
            "custom_conversion": {
                "a$Optional": [
                    "a$Optional b$OptionalConversions#convert(b$Optional)",
                    "a$Optional b$OptionalConversions#convert(a$Optional)"
                ]
            }
        }"#,
    ))
    .unwrap_err();
    assert!(matches!(err, SpecificationError::InvalidCustomConversion { .. }));
}

#[test]
fn rewritten_and_maintained_types_are_rejected() {
    let err = parse_program(&document(
        r#"{
            "api_level_below_or_equal": 23,
            "rewrite_type": {"a$Optional": "b$Optional"},
            "maintain_type": ["a$Optional"]
        }"#,
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        SpecificationError::RewrittenAndMaintained { ref types } if types == &["java.util.Optional"]
    ));
}

#[test]
fn unknown_synthetic_kind_ids_are_rejected_in_every_range() {
    let text = document(
        r#"{
            "api_level_below_or_equal": 40,
            "api_level_greater_or_equal": 35,
            "emulated_virtual_retarget": {
                "void a$Map#clear()": [
                    ["void b$Map#clear()", -1],
                    ["void a$Map#clear(a$Map)", "47"],
                    ["void a$Map#clear(a$Map)", 10],
                    {}
                ]
            }
        }"#,
    );
    // The range does not apply to level 19, so a resolving parse never reads it.
    assert!(parse_program(&text).is_ok());

    let mut table = SymbolTable::new();
    let err = parse_multi_api_level(&mut table, &text, Origin::named("kinds")).unwrap_err();
    assert!(matches!(err, SpecificationError::UnknownSyntheticKind { id: 47, .. }));
}

#[test]
fn errors_carry_the_document_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desugar.json");
    std::fs::write(
        &path,
        fixture_with(|root| {
            root.insert("configuration_format_version".into(), 300.into());
        }),
    )
    .unwrap();

    let mut table = SymbolTable::new();
    let err = parse_path(&mut table, &path, 19, CompilationKind::Program).unwrap_err();
    assert!(
        err.to_string().starts_with(&path.display().to_string()),
        "{err}"
    );

    let missing = dir.path().join("missing.json");
    let err = parse_path(&mut table, &missing, 19, CompilationKind::Program).unwrap_err();
    assert!(matches!(err, SpecificationError::Io { .. }));
}
