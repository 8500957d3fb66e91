mod errors;
mod package_map;
mod range_gating;
mod roundtrip;

/// A realistic document written the way older tooling wrote them: package map
/// as `{package: token}` and synthetic kind ids as strings.
pub(crate) const FIXTURE: &str = include_str!("../fixtures/desugar_jdk_libs.json");

pub(crate) const PACKAGE_MAP: &str = r#"{"a$": "java.util", "b$": "j$.util", "c$": "java.lang", "d$": "j$.lang"}"#;

/// A minimal document whose `common_flags` holds `common`.
pub(crate) fn document(common: &str) -> String {
    document_with(PACKAGE_MAP, common, "", "")
}

pub(crate) fn document_with(package_map: &str, common: &str, library: &str, program: &str) -> String {
    format!(
        r#"{{
            "configuration_format_version": 200,
            "identifier": "test:configuration:1.0.0",
            "required_compilation_api_level": 30,
            "synthesized_library_classes_package_prefix": "j$.",
            "support_all_callbacks_from_library": false,
            "shrinker_config": "",
            "common_flags": [{common}],
            "library_flags": [{library}],
            "program_flags": [{program}],
            "package_map": {package_map}
        }}"#
    )
}
