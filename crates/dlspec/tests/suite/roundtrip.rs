use dlspec::{
    export, export_resolved, export_to_string, parse, parse_multi_api_level, ApiLevelRange,
    CompilationKind, Origin, SymbolTable,
};
use pretty_assertions::assert_eq;

use super::FIXTURE;

#[test]
fn multi_api_level_document_round_trips() {
    let mut table = SymbolTable::new();
    let parsed = parse_multi_api_level(&mut table, FIXTURE, Origin::named("fixture")).unwrap();
    let exported = export_to_string(&table, &parsed, true).unwrap();
    let reparsed =
        parse_multi_api_level(&mut table, &exported, Origin::named("exported")).unwrap();

    assert_eq!(parsed, reparsed);
    assert_eq!(
        reparsed.top_level_flags().json_source.as_deref(),
        Some(exported.as_str())
    );
}

#[test]
fn export_is_canonical() {
    let mut table = SymbolTable::new();
    let parsed = parse_multi_api_level(&mut table, FIXTURE, Origin::named("fixture")).unwrap();
    let first = export_to_string(&table, &parsed, false).unwrap();
    let reparsed = parse_multi_api_level(&mut table, &first, Origin::named("first")).unwrap();
    let second = export_to_string(&table, &reparsed, false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn resolved_specifications_round_trip() {
    let mut table = SymbolTable::new();
    let cases = [
        (19, CompilationKind::Program),
        (23, CompilationKind::Library),
        (26, CompilationKind::Program),
        (33, CompilationKind::Library),
    ];
    for (level, compilation) in cases {
        let resolved = parse(
            &mut table,
            FIXTURE,
            Origin::named("fixture"),
            level,
            compilation,
        )
        .unwrap();
        let document = export_resolved(&table, &resolved).unwrap().to_string();
        let reparsed = parse(
            &mut table,
            &document,
            Origin::named("resolved"),
            level,
            compilation,
        )
        .unwrap();
        assert_eq!(resolved, reparsed, "level {level}, {compilation}");
    }
}

#[test]
fn dispatch_case_order_survives_export() {
    let mut table = SymbolTable::new();
    let parsed = parse_multi_api_level(&mut table, FIXTURE, Origin::named("fixture")).unwrap();
    let case_names = |table: &SymbolTable, spec: &dlspec::MultiApiLevelSpecification| {
        let flags = &spec.common_flags()[&ApiLevelRange::below_or_equal(23)];
        let (_, descriptor) = flags.emulated_virtual_retarget().first().unwrap();
        descriptor
            .dispatch_cases()
            .keys()
            .map(|ty| table.java_name(*ty))
            .collect::<Vec<_>>()
    };
    let expected = vec![
        "java.util.concurrent.ConcurrentHashMap".to_string(),
        "java.util.HashMap".to_string(),
    ];
    assert_eq!(case_names(&table, &parsed), expected);

    let document = export(&table, &parsed).unwrap();
    // Most recent range first: `[24, 32]` then `[.., 23]`.
    let cases = document["common_flags"][1]["emulated_virtual_retarget"]
        .as_object()
        .unwrap()
        .values()
        .next()
        .unwrap()[3]
        .as_object()
        .unwrap();
    let rendered: Vec<&String> = cases.keys().collect();
    assert!(rendered[0].ends_with("ConcurrentHashMap"), "{rendered:?}");
    assert!(rendered[1].ends_with("HashMap"), "{rendered:?}");

    let reparsed =
        parse_multi_api_level(&mut table, &document.to_string(), Origin::named("exported"))
            .unwrap();
    assert_eq!(case_names(&table, &reparsed), expected);
}

#[test]
fn wrapper_order_survives_export() {
    let mut table = SymbolTable::new();
    let parsed = parse_multi_api_level(&mut table, FIXTURE, Origin::named("fixture")).unwrap();
    let document = export(&table, &parsed).unwrap();
    let wrappers: Vec<&String> = document["common_flags"][1]["wrapper"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(wrappers.len(), 2);
    assert!(wrappers[0].ends_with("$Consumer"), "{wrappers:?}");
    assert!(wrappers[1].ends_with("$BiConsumer"), "{wrappers:?}");
}

#[test]
fn export_writes_tokens_as_keys_and_integer_kind_ids() {
    let mut table = SymbolTable::new();
    let parsed = parse_multi_api_level(&mut table, FIXTURE, Origin::named("fixture")).unwrap();
    let document = export(&table, &parsed).unwrap();

    let package_map = document["package_map"].as_object().unwrap();
    assert!(package_map.keys().all(|token| dlspec::is_token(token)));
    assert_eq!(package_map["a$"], "j$.lang");

    let descriptor = document["common_flags"][1]["emulated_virtual_retarget"]
        .as_object()
        .unwrap()
        .values()
        .next()
        .unwrap();
    assert_eq!(descriptor[0][1], -1);
    assert_eq!(descriptor[1][1], 11);
    assert_eq!(descriptor[2][1], 10);
}

#[test]
fn empty_categories_are_omitted() {
    let mut table = SymbolTable::new();
    let parsed = parse_multi_api_level(&mut table, FIXTURE, Origin::named("fixture")).unwrap();
    let document = export(&table, &parsed).unwrap();
    let recent = document["common_flags"][0].as_object().unwrap();
    let keys: Vec<&str> = recent.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "api_level_below_or_equal",
            "api_level_greater_or_equal",
            "static_retarget"
        ]
    );
}
