use super::*;
use crate::error::CoreError;
use std::fs;
use tempfile::tempdir;

fn memory_bundle() -> MemoryBundle {
    MemoryBundle::new()
        .with("app/migrations/2_AddTable.sql", "CREATE TABLE t (id INT);")
        .with("app/migrations/1_Init.sql", "CREATE SCHEMA app;")
        .with("app/migrations/readme.txt", "not a script")
        .with("app/seeds/1_Seed.sql", "INSERT INTO t VALUES (1);")
}

#[test]
fn test_bundle_lists_scripts_under_root() {
    let provider = BundleProvider::new("app/migrations", memory_bundle()).unwrap();
    let scripts = provider.list().unwrap();

    let names: Vec<String> = scripts.iter().map(|s| s.to_string()).collect();
    assert_eq!(names, vec!["1_Init", "2_AddTable"]);
    assert_eq!(scripts[0].origin, "bundle:app/migrations");
    assert_eq!(scripts[0].locator, "app/migrations/1_Init.sql");
}

#[test]
fn test_bundle_loads_content() {
    let provider = BundleProvider::new("app/migrations", memory_bundle()).unwrap();
    let scripts = provider.list().unwrap();
    assert_eq!(provider.load(&scripts[1]).unwrap(), "CREATE TABLE t (id INT);");
}

#[test]
fn test_bundle_root_trailing_separator_is_normalised() {
    let provider = BundleProvider::new("/app/seeds/", memory_bundle()).unwrap();
    assert_eq!(provider.root(), "app/seeds");
    assert_eq!(provider.list().unwrap().len(), 1);
}

#[test]
fn test_bundle_empty_root_is_rejected() {
    let err = BundleProvider::new("", MemoryBundle::new()).err().unwrap();
    assert!(matches!(err, CoreError::InvalidProviderRoot { .. }));
    assert!(err.is_configuration_error());

    assert!(BundleProvider::new("/", MemoryBundle::new()).is_err());
}

#[test]
fn test_bundle_missing_resource_is_script_not_found() {
    let provider = BundleProvider::new("app/migrations", memory_bundle()).unwrap();
    let mut script = provider.list().unwrap().remove(0);
    script.locator = "app/migrations/9_Gone.sql".to_string();

    let err = provider.load(&script).unwrap_err();
    assert!(matches!(err, CoreError::ScriptNotFound { .. }));
    assert!(!err.is_configuration_error());
}

#[test]
fn test_bundle_malformed_name_fails_listing() {
    let bundle = MemoryBundle::new().with("m/first_Init.sql", "SELECT 1;");
    let provider = BundleProvider::new("m", bundle).unwrap();
    assert!(matches!(
        provider.list().unwrap_err(),
        CoreError::InvalidSequenceId { .. }
    ));
}

#[test]
fn test_filesystem_lists_sorted_scripts() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("10_AddIndex.sql"), "CREATE INDEX i ON t(id);").unwrap();
    fs::write(dir.path().join("2_AddTable.SQL"), "CREATE TABLE t (id INT);").unwrap();
    fs::write(dir.path().join("1_Init.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join("notes.md"), "# notes").unwrap();
    fs::create_dir(dir.path().join("archive")).unwrap();
    fs::write(dir.path().join("archive").join("3_Old.sql"), "SELECT 3;").unwrap();

    let provider = FilesystemProvider::new(dir.path()).unwrap();
    let scripts = provider.list().unwrap();

    let ids: Vec<i64> = scripts.iter().map(|s| s.sequence_id).collect();
    assert_eq!(ids, vec![1, 2, 10]);
    assert_eq!(scripts[1].name, "AddTable");
    assert!(scripts[0].origin.starts_with("filesystem:"));
}

#[test]
fn test_filesystem_loads_content() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1_Init.sql"), "CREATE TABLE a (id INT);").unwrap();

    let provider = FilesystemProvider::new(dir.path()).unwrap();
    let scripts = provider.list().unwrap();
    assert_eq!(
        provider.load(&scripts[0]).unwrap(),
        "CREATE TABLE a (id INT);"
    );
}

#[test]
fn test_filesystem_file_removed_after_listing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("1_Init.sql");
    fs::write(&path, "SELECT 1;").unwrap();

    let provider = FilesystemProvider::new(dir.path()).unwrap();
    let scripts = provider.list().unwrap();
    fs::remove_file(&path).unwrap();

    assert!(matches!(
        provider.load(&scripts[0]).unwrap_err(),
        CoreError::ScriptNotFound { .. }
    ));
}

#[test]
fn test_filesystem_missing_directory_is_invalid_root() {
    let dir = tempdir().unwrap();
    let provider = FilesystemProvider::new(dir.path().join("does_not_exist")).unwrap();
    assert!(matches!(
        provider.list().unwrap_err(),
        CoreError::InvalidProviderRoot { .. }
    ));
}

#[test]
fn test_filesystem_empty_root_is_rejected() {
    assert!(matches!(
        FilesystemProvider::new("").unwrap_err(),
        CoreError::InvalidProviderRoot { .. }
    ));
}

#[test]
fn test_filesystem_duplicate_ids_rejected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1_Init.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join("001_Again.sql"), "SELECT 1;").unwrap();

    let provider = FilesystemProvider::new(dir.path()).unwrap();
    assert!(matches!(
        provider.list().unwrap_err(),
        CoreError::DuplicateSequenceId { sequence_id: 1, .. }
    ));
}

#[test]
fn test_filesystem_locator_is_relative_to_root() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1_Init.sql"), "SELECT 1;").unwrap();

    let provider = FilesystemProvider::new(dir.path()).unwrap();
    let scripts = provider.list().unwrap();
    assert_eq!(scripts[0].locator, "1_Init.sql");
}

#[cfg(target_os = "linux")]
#[test]
fn test_filesystem_non_utf8_root_loads_scripts() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let root = dir.path().join(OsStr::from_bytes(b"migr\xffations"));
    fs::create_dir(&root).unwrap();
    fs::write(root.join("1_Init.sql"), "CREATE TABLE a (id INT);").unwrap();

    let provider = FilesystemProvider::new(&root).unwrap();
    let scripts = provider.list().unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(
        provider.load(&scripts[0]).unwrap(),
        "CREATE TABLE a (id INT);"
    );
}

#[cfg(unix)]
#[test]
fn test_filesystem_unreadable_root_is_invalid_root() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = dir.path().join("locked");
    fs::create_dir(&root).unwrap();
    fs::set_permissions(&root, fs::Permissions::from_mode(0o000)).unwrap();

    let provider = FilesystemProvider::new(&root).unwrap();
    let result = provider.list();
    fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();

    // root bypasses directory permissions, so only check the error shape
    if let Err(err) = result {
        assert!(matches!(err, CoreError::InvalidProviderRoot { .. }));
        assert!(err.is_configuration_error());
    }
}
