//! Tests for layered configuration loading.

use std::collections::HashMap;
use stowage::{StorageService, StowageConfig};
use tempfile::TempDir;

fn no_env() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn test_bundled_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.toml");
    std::fs::write(&path, "").unwrap();

    let options = StowageConfig::new()
        .without_user_config()
        .with_file(&path)
        .with_environment(no_env())
        .build()
        .unwrap();

    assert_eq!(options.get("storage.backend"), Some("filesystem"));
    assert_eq!(options.get("storage.file.dir"), Some("data/storage"));
}

#[test]
fn test_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stowage.toml");
    std::fs::write(
        &path,
        r#"
[storage]
backend = "s3"

[storage.s3]
key_id = "AKID"
key_secret = "secret"
bucket = "media"
default_storage_class = "STANDARD"
"#,
    )
    .unwrap();

    let options = StowageConfig::new()
        .without_user_config()
        .with_file(&path)
        .with_environment(no_env())
        .build()
        .unwrap();

    assert_eq!(options.get("storage.backend"), Some("s3"));
    assert_eq!(options.get("storage.s3.bucket"), Some("media"));
    assert_eq!(options.get("storage.s3.default_storage_class"), Some("STANDARD"));
    // Untouched defaults survive
    assert_eq!(options.get("storage.file.dir"), Some("data/storage"));

    let service = StorageService::from_options(&options).unwrap();
    assert_eq!(service.backend_name(), "s3");
}

#[test]
fn test_environment_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stowage.toml");
    std::fs::write(&path, "[storage.file]\ndir = \"from-file\"\n").unwrap();

    let env = HashMap::from([
        ("STOWAGE_STORAGE__FILE__DIR".to_string(), "from-env".to_string()),
        ("STOWAGE_STORAGE__URL__ROOT".to_string(), "/media/".to_string()),
        ("UNRELATED".to_string(), "ignored".to_string()),
    ]);

    let options = StowageConfig::new()
        .without_user_config()
        .with_file(&path)
        .with_environment(env)
        .build()
        .unwrap();

    assert_eq!(options.get("storage.file.dir"), Some("from-env"));
    assert_eq!(options.get("storage.url.root"), Some("/media/"));
    assert!(options.iter().all(|(name, _)| name != "unrelated"));
}

#[test]
fn test_missing_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = StowageConfig::new()
        .without_user_config()
        .with_file(temp_dir.path().join("absent.toml"))
        .with_environment(no_env())
        .build()
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_malformed_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[storage\nbackend = ").unwrap();

    let err = StowageConfig::new()
        .without_user_config()
        .with_file(&path)
        .with_environment(no_env())
        .build()
        .unwrap_err();
    assert!(err.is_config());
}
