use std::ffi::OsString;

use dlspec_config::{
    discover_config_path, load_for_dir, with_config_env_lock, DlspecConfig, DLSPEC_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_dlspec_toml_in_directory() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(DLSPEC_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("dlspec.toml");
        std::fs::write(&config_path, "[specification]\nmin_api_level = 24\n").unwrap();

        let discovered = discover_config_path(dir.path()).expect("dlspec.toml should be discovered");
        assert_eq!(
            discovered,
            config_path.canonicalize().unwrap_or(config_path)
        );

        let (config, path) = load_for_dir(dir.path()).unwrap();
        assert!(path.is_some());
        assert_eq!(config.specification.min_api_level, 24);
    });
}

#[test]
fn missing_config_falls_back_to_defaults() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(DLSPEC_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        assert_eq!(discover_config_path(dir.path()), None);
        let (config, path) = load_for_dir(dir.path()).unwrap();
        assert_eq!(path, None);
        assert_eq!(config, DlspecConfig::default());
    });
}

#[test]
fn env_var_overrides_discovery() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("dlspec.toml"), "").unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "[specification]\ncompilation = \"library\"\n").unwrap();

        let _env = EnvVarGuard::set(DLSPEC_CONFIG_ENV_VAR, std::path::Path::new("custom.toml"));
        let discovered = discover_config_path(dir.path()).unwrap();
        assert_eq!(discovered, explicit.canonicalize().unwrap_or(explicit));

        let (config, _) = load_for_dir(dir.path()).unwrap();
        assert!(config.specification.compilation_kind().is_library());
    });
}
