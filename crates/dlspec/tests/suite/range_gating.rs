use dlspec::{
    parse, parse_multi_api_level, ApiLevelRange, CompilationKind, Origin, RuleCategory,
    SpecificationError, SymbolTable,
};
use pretty_assertions::assert_eq;

use super::{document, FIXTURE};

fn rewrites(text: &str, level: u32) -> usize {
    let mut table = SymbolTable::new();
    parse(
        &mut table,
        text,
        Origin::named("gating"),
        level,
        CompilationKind::Program,
    )
    .unwrap()
    .rewriting_flags()
    .len(RuleCategory::RewriteType)
}

#[test]
fn upper_bound_is_inclusive() {
    let text = document(
        r#"{"api_level_below_or_equal": 23, "rewrite_type": {"a$Optional": "b$Optional"}}"#,
    );
    assert_eq!(rewrites(&text, 24), 0);
    assert_eq!(rewrites(&text, 23), 1);
    assert_eq!(rewrites(&text, 1), 1);
}

#[test]
fn lower_bound_excludes_older_levels() {
    let text = document(
        r#"{
            "api_level_below_or_equal": 23,
            "api_level_greater_or_equal": 21,
            "rewrite_type": {"a$Optional": "b$Optional"}
        }"#,
    );
    assert_eq!(rewrites(&text, 20), 0);
    assert_eq!(rewrites(&text, 21), 1);
    assert_eq!(rewrites(&text, 23), 1);
}

#[test]
fn empty_window_never_matches() {
    let text = document(
        r#"{
            "api_level_below_or_equal": 23,
            "api_level_greater_or_equal": 24,
            "rewrite_type": {"a$Optional": "b$Optional"}
        }"#,
    );
    for level in [1, 19, 23, 24, 30, u32::MAX] {
        assert_eq!(rewrites(&text, level), 0, "level {level}");
    }
}

#[test]
fn map_for_each_is_retargeted_for_old_programs() {
    let mut table = SymbolTable::new();
    let spec = parse(
        &mut table,
        FIXTURE,
        Origin::named("fixture"),
        19,
        CompilationKind::Program,
    )
    .unwrap();
    let flags = spec.rewriting_flags();
    let retargeted: Vec<String> = flags
        .emulated_virtual_retarget()
        .keys()
        .map(|method| table.display_method(*method))
        .collect();
    assert_eq!(
        retargeted,
        vec!["void java.util.Map#forEach(java.util.function.BiConsumer)"]
    );
    // Program-specific rules merge with the common ones.
    assert_eq!(flags.rewrite_type().len(), 4);
    assert!(flags.static_retarget().is_empty());

    let library = parse(
        &mut table,
        FIXTURE,
        Origin::named("fixture"),
        19,
        CompilationKind::Library,
    )
    .unwrap();
    assert_eq!(library.rewriting_flags().rewrite_type().len(), 3);
    assert_eq!(library.rewriting_flags().rewrite_derived_type_only().len(), 1);
    assert!(library.is_library_compilation());
}

#[test]
fn recent_programs_only_get_recent_rules() {
    let mut table = SymbolTable::new();
    let spec = parse(
        &mut table,
        FIXTURE,
        Origin::named("fixture"),
        26,
        CompilationKind::Program,
    )
    .unwrap();
    let flags = spec.rewriting_flags();
    assert!(flags.emulated_virtual_retarget().is_empty());
    assert_eq!(
        flags
            .static_retarget()
            .values()
            .map(|method| table.display_method(*method))
            .collect::<Vec<_>>(),
        vec!["int j$.lang.Math$-CC#floorMod(int, int)"]
    );
    assert_eq!(spec.identifier(), "com.tools.android:desugar_jdk_libs_configuration:2.1.0");
    assert_eq!(spec.synthesized_library_classes_package_prefix(), "j$.");
    assert_eq!(
        spec.extra_keep_rules(),
        "-keepattributes Signature\n-dontwarn sun.misc.Unsafe\n"
    );
}

#[test]
fn matching_ranges_merge_independently() {
    let text = document(
        r#"{
            "api_level_below_or_equal": 23,
            "static_retarget": {"int c$Math#floorMod(int, int)": "int d$Math$-CC#floorMod(int, int)"}
        },
        {
            "api_level_below_or_equal": 30,
            "api_level_greater_or_equal": 19,
            "static_retarget": {"int c$Math#floorDiv(int, int)": "int d$Math$-CC#floorDiv(int, int)"}
        }"#,
    );
    let mut table = SymbolTable::new();
    let spec = parse(
        &mut table,
        &text,
        Origin::named("merge"),
        21,
        CompilationKind::Program,
    )
    .unwrap();
    let mut names: Vec<String> = spec
        .rewriting_flags()
        .static_retarget()
        .keys()
        .map(|method| table.method_name(*method).to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["floorDiv", "floorMod"]);
}

#[test]
fn conflicting_matching_ranges_fail_loudly() {
    let text = document(
        r#"{
            "api_level_below_or_equal": 23,
            "rewrite_type": {"a$Optional": "b$Optional"}
        },
        {
            "api_level_below_or_equal": 30,
            "api_level_greater_or_equal": 21,
            "rewrite_type": {"a$Optional": "d$Optional"}
        }"#,
    );
    let mut table = SymbolTable::new();
    let err = parse(
        &mut table,
        &text,
        Origin::named("conflict"),
        22,
        CompilationKind::Program,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SpecificationError::ConflictingEntry { category: "rewrite_type", ref key }
            if key == "java.util.Optional"
    ));

    // Only one of the two ranges applies at 19 and at 24.
    assert_eq!(rewrites(&text, 19), 1);
    assert_eq!(rewrites(&text, 24), 1);
}

#[test]
fn identical_ranges_merge_in_multi_level_documents() {
    let text = document(
        r#"{
            "api_level_below_or_equal": 23,
            "rewrite_type": {"a$Optional": "b$Optional"}
        },
        {
            "api_level_below_or_equal": 23,
            "dont_retarget": ["b$DesugarTimeZone"]
        }"#,
    );
    let mut table = SymbolTable::new();
    let spec = parse_multi_api_level(&mut table, &text, Origin::named("merge")).unwrap();
    assert_eq!(spec.common_flags().len(), 1);
    let flags = &spec.common_flags()[&ApiLevelRange::below_or_equal(23)];
    assert_eq!(flags.rewrite_type().len(), 1);
    assert_eq!(flags.dont_retarget().len(), 1);
}

#[test]
fn resolving_a_parsed_document_matches_direct_parsing() {
    let mut table = SymbolTable::new();
    let multi = parse_multi_api_level(&mut table, FIXTURE, Origin::named("fixture")).unwrap();
    assert_eq!(
        multi.ranges(),
        vec![
            ApiLevelRange::between(24, 32),
            ApiLevelRange::below_or_equal(32),
            ApiLevelRange::below_or_equal(23),
        ]
    );
    for level in [1, 19, 23, 24, 30, 32, 33] {
        for compilation in [CompilationKind::Program, CompilationKind::Library] {
            let direct = parse(
                &mut table,
                FIXTURE,
                Origin::named("fixture"),
                level,
                compilation,
            )
            .unwrap();
            let resolved = multi.resolve(&table, level, compilation).unwrap();
            assert_eq!(direct, resolved, "level {level}, {compilation}");
        }
    }
}
