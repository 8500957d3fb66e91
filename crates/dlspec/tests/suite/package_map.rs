use std::collections::BTreeMap;

use dlspec::{
    export, parse, parse_multi_api_level, ApiLevelRange, CompilationKind,
    MultiApiLevelSpecification, Origin, RewritingFlags, SpecificationError, SymbolTable,
    TopLevelFlags,
};
use pretty_assertions::assert_eq;

use super::document_with;

const MAINTAIN_BAR: &str =
    r#"{"api_level_below_or_equal": 23, "maintain_type": ["a$Bar", "a$Bar[][]", "int[]"]}"#;

#[test]
fn compressed_names_decode_through_the_package_map() {
    let text = document_with(r#"{"a$": "com.foo"}"#, MAINTAIN_BAR, "", "");
    let mut table = SymbolTable::new();
    let spec = parse(
        &mut table,
        &text,
        Origin::named("decode"),
        21,
        CompilationKind::Program,
    )
    .unwrap();
    let maintained: Vec<_> = spec.rewriting_flags().maintain_type().iter().copied().collect();
    assert_eq!(
        maintained
            .iter()
            .map(|ty| table.java_name(*ty))
            .collect::<Vec<_>>(),
        vec!["com.foo.Bar", "com.foo.Bar[][]", "int[]"]
    );
    assert_eq!(table.array_dimensions(maintained[1]), 2);
    assert_eq!(table.descriptor(maintained[1]), "[[Lcom/foo/Bar;");
}

#[test]
fn both_package_map_orientations_are_accepted() {
    let mut table = SymbolTable::new();
    let token_first = document_with(r#"{"a$": "com.foo"}"#, MAINTAIN_BAR, "", "");
    let package_first = document_with(r#"{"com.foo": "a$"}"#, MAINTAIN_BAR, "", "");
    let left = parse_multi_api_level(&mut table, &token_first, Origin::named("left")).unwrap();
    let right = parse_multi_api_level(&mut table, &package_first, Origin::named("right")).unwrap();
    assert_eq!(left, right);
}

#[test]
fn default_package_types_round_trip() {
    let text = document_with(
        r#"{"a$": "", "b$": "com.foo"}"#,
        r#"{"api_level_below_or_equal": 23, "rewrite_type": {"a$Local": "b$Local"}}"#,
        "",
        "",
    );
    let mut table = SymbolTable::new();
    let parsed = parse_multi_api_level(&mut table, &text, Origin::named("default")).unwrap();
    let flags = &parsed.common_flags()[&ApiLevelRange::below_or_equal(23)];
    let (from, to) = flags.rewrite_type().first().unwrap();
    assert_eq!(table.java_name(*from), "Local");
    assert_eq!(table.java_name(*to), "com.foo.Local");

    let exported = export(&table, &parsed).unwrap();
    assert_eq!(exported["package_map"]["a$"], "");
    let reparsed =
        parse_multi_api_level(&mut table, &exported.to_string(), Origin::named("exported"))
            .unwrap();
    assert_eq!(parsed, reparsed);
}

#[test]
fn export_fails_when_tokens_run_out() {
    let mut table = SymbolTable::new();
    let mut flags = RewritingFlags::builder();
    for index in 0..=dlspec::TOKEN_ALPHABET.chars().count() {
        let ty = table
            .intern_java_type(&format!("com.example.p{index}.Type"))
            .unwrap();
        flags.maintain_type(ty);
    }
    let specification = MultiApiLevelSpecification::new(
        Origin::named("exhausted"),
        TopLevelFlags::default(),
        BTreeMap::from([(ApiLevelRange::unbounded(), flags.build(&table).unwrap())]),
        BTreeMap::new(),
        BTreeMap::new(),
    );
    assert!(matches!(
        export(&table, &specification),
        Err(SpecificationError::PackageTokensExhausted)
    ));
}
