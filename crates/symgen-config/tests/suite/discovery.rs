use symgen_config::{discover_config_path, load_for_root, ConfigError, CONFIG_FILE_NAME};
use tempfile::tempdir;

#[test]
fn discovers_the_config_file_in_the_root() {
    let dir = tempdir().expect("tempdir");
    assert_eq!(discover_config_path(dir.path()), None);

    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "").expect("write config");
    assert_eq!(discover_config_path(dir.path()), Some(path));
}

#[test]
fn a_directory_named_like_the_config_is_ignored() {
    let dir = tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join(CONFIG_FILE_NAME)).expect("create dir");
    assert_eq!(discover_config_path(dir.path()), None);
}

#[test]
fn invalid_config_files_fail_to_load() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[generator]\nreserved_prefix = \"\"\n",
    )
    .expect("write config");

    let err = load_for_root(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    assert_eq!(
        err.to_string(),
        "invalid config: generator.reserved_prefix must not be empty"
    );
}
