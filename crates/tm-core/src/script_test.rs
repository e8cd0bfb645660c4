use super::*;

fn entry(key: &str) -> (String, String) {
    (key.to_string(), key.to_string())
}

#[test]
fn test_parse_documented_example() {
    let parsed = parse_script_key("root/prefix/20190301001_AddPeopleTable.sql", "root/prefix")
        .unwrap()
        .unwrap();
    assert_eq!(parsed.sequence_id, 20190301001);
    assert_eq!(parsed.name, "AddPeopleTable");
}

#[test]
fn test_parse_name_keeps_later_underscores() {
    let parsed = parse_script_key("m/3_add_index_on_people.sql", "m")
        .unwrap()
        .unwrap();
    assert_eq!(parsed.sequence_id, 3);
    assert_eq!(parsed.name, "add_index_on_people");
}

#[test]
fn test_parse_extension_case_insensitive() {
    let parsed = parse_script_key("m/1_Init.SQL", "m").unwrap().unwrap();
    assert_eq!(parsed.sequence_id, 1);
    assert_eq!(parsed.name, "Init");
}

#[test]
fn test_parse_root_with_trailing_separator() {
    let parsed = parse_script_key("m/1_Init.sql", "m/").unwrap().unwrap();
    assert_eq!(parsed.name, "Init");
}

#[test]
fn test_parse_ignores_other_extensions() {
    assert!(parse_script_key("m/1_Init.txt", "m").unwrap().is_none());
    assert!(parse_script_key("m/README.md", "m").unwrap().is_none());
    assert!(parse_script_key("m/1_Init.sql.bak", "m").unwrap().is_none());
}

#[test]
fn test_parse_ignores_keys_outside_root() {
    assert!(parse_script_key("other/1_Init.sql", "m").unwrap().is_none());
    assert!(parse_script_key("mig/1_Init.sql", "m").unwrap().is_none());
    assert!(parse_script_key("1_Init.sql", "m").unwrap().is_none());
}

#[test]
fn test_parse_ignores_nested_folders() {
    assert!(parse_script_key("m/archive/1_Init.sql", "m")
        .unwrap()
        .is_none());
}

#[test]
fn test_parse_non_numeric_id_is_error() {
    let err = parse_script_key("m/abc_Init.sql", "m").unwrap_err();
    assert!(matches!(err, CoreError::InvalidSequenceId { ref value, .. } if value == "abc"));
    assert!(err.is_configuration_error());
}

#[test]
fn test_parse_negative_id_is_error() {
    let err = parse_script_key("m/-1_Init.sql", "m").unwrap_err();
    assert!(matches!(err, CoreError::InvalidSequenceId { .. }));
}

#[test]
fn test_parse_overflowing_id_is_error() {
    let err = parse_script_key("m/99999999999999999999_Init.sql", "m").unwrap_err();
    assert!(matches!(err, CoreError::InvalidSequenceId { .. }));
}

#[test]
fn test_parse_missing_separator_is_error() {
    let err = parse_script_key("m/001.sql", "m").unwrap_err();
    assert!(matches!(err, CoreError::MalformedScriptKey { .. }));
}

#[test]
fn test_parse_empty_name_is_error() {
    let err = parse_script_key("m/5_.sql", "m").unwrap_err();
    assert!(matches!(err, CoreError::MalformedScriptKey { .. }));
}

#[test]
fn test_collect_sorts_by_sequence_id() {
    let scripts = collect_scripts(
        vec![
            entry("m/10_Ten.sql"),
            entry("m/2_Two.sql"),
            entry("m/notes.txt"),
            entry("m/1_One.sql"),
        ],
        "m",
        "test",
    )
    .unwrap();

    let ids: Vec<i64> = scripts.iter().map(|s| s.sequence_id).collect();
    assert_eq!(ids, vec![1, 2, 10]);
    assert_eq!(scripts[0].name, "One");
    assert_eq!(scripts[0].locator, "m/1_One.sql");
    assert_eq!(scripts[0].origin, "test");
}

#[test]
fn test_collect_rejects_duplicate_ids() {
    let err = collect_scripts(
        vec![entry("m/1_One.sql"), entry("m/01_Uno.sql")],
        "m",
        "test",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CoreError::DuplicateSequenceId { sequence_id: 1, .. }
    ));
}

#[test]
fn test_collect_empty() {
    let scripts = collect_scripts(Vec::new(), "m", "test").unwrap();
    assert!(scripts.is_empty());
}

#[test]
fn test_script_display() {
    let script = ScriptInfo {
        sequence_id: 2,
        name: "AddTable".to_string(),
        locator: "m/2_AddTable.sql".to_string(),
        origin: "test".to_string(),
    };
    assert_eq!(script.to_string(), "2_AddTable");
}
