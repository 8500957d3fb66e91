//! JSON keys of the machine specification document.

pub const CONFIGURATION_FORMAT_VERSION: &str = "configuration_format_version";
pub const IDENTIFIER: &str = "identifier";
pub const REQUIRED_COMPILATION_API_LEVEL: &str = "required_compilation_api_level";
pub const SYNTHESIZED_LIBRARY_CLASSES_PACKAGE_PREFIX: &str =
    "synthesized_library_classes_package_prefix";
pub const SUPPORT_ALL_CALLBACKS_FROM_LIBRARY: &str = "support_all_callbacks_from_library";
pub const SHRINKER_CONFIG: &str = "shrinker_config";
pub const COMMON_FLAGS: &str = "common_flags";
pub const LIBRARY_FLAGS: &str = "library_flags";
pub const PROGRAM_FLAGS: &str = "program_flags";
pub const PACKAGE_MAP: &str = "package_map";

pub const API_LEVEL_BELOW_OR_EQUAL: &str = "api_level_below_or_equal";
pub const API_LEVEL_GREATER_OR_EQUAL: &str = "api_level_greater_or_equal";

pub const REWRITE_TYPE: &str = "rewrite_type";
pub const MAINTAIN_TYPE: &str = "maintain_type";
pub const REWRITE_DERIVED_TYPE_ONLY: &str = "rewrite_derived_type_only";
pub const STATIC_FIELD_RETARGET: &str = "static_field_retarget";
pub const COVARIANT_RETARGET: &str = "covariant_retarget";
pub const STATIC_RETARGET: &str = "static_retarget";
pub const NON_EMULATED_VIRTUAL_RETARGET: &str = "non_emulated_virtual_retarget";
pub const EMULATED_VIRTUAL_RETARGET: &str = "emulated_virtual_retarget";
pub const EMULATED_VIRTUAL_RETARGET_THROUGH_EMULATED_INTERFACE: &str =
    "emulated_virtual_retarget_through_emulated_interface";
pub const API_GENERIC_TYPES_CONVERSION: &str = "api_generic_types_conversion";
pub const EMULATED_INTERFACE: &str = "emulated_interface";
pub const WRAPPER: &str = "wrapper";
pub const LEGACY_BACKPORT: &str = "legacy_backport";
pub const DONT_RETARGET: &str = "dont_retarget";
pub const CUSTOM_CONVERSION: &str = "custom_conversion";
pub const AMEND_LIBRARY_METHOD: &str = "amend_library_method";
pub const AMEND_LIBRARY_FIELD: &str = "amend_library_field";

/// The only schema version this crate reads and writes.
pub const CURRENT_VERSION: i64 = 200;
pub const MIN_SUPPORTED_VERSION: i64 = 200;
pub const MAX_SUPPORTED_VERSION: i64 = 200;
