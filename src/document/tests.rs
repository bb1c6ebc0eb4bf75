use super::*;
use crate::codec::SourceEncoding;
use crate::error::ConfigError;
use crate::io::FileSystem;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

const SAMPLE: &str = r#"{
  "PathCfg": {
    "pathRecords": [
      {"name": "路径：说话之岛码头", "attackSteps": [{"map": 0, "position": {"x": 1, "y": 2}, "type": "PATH"}]}
    ]
  },
  "ItemCfg": {"potion": "红色药水", "ratio": 0.5, "zebra": 1, "apple": 2},
  "AttackCfg": {"MPSpell": []}
}"#;

const COMMENTED: &str = r#"# 自动换头盔设置
{
  // 路径配置
  "PathCfg": {"pathRecords": []}, /* 旧版字段
  "Legacy": 1, */
  "url": "http://example.com/a"
}"#;

/// 创建测试用的配置文件
fn write_sample(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_load_preserves_key_order() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", SAMPLE);

    let doc = DocumentStore::new().load(&path).unwrap();
    let sections: Vec<_> = doc.section_names().collect();
    assert_eq!(sections, vec!["PathCfg", "ItemCfg", "AttackCfg"]);

    let keys: Vec<_> = doc.section("ItemCfg").unwrap().as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["potion", "ratio", "zebra", "apple"]);
}

#[test]
fn test_roundtrip_is_stable() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", SAMPLE);
    let store = DocumentStore::new();

    let doc = store.load(&path).unwrap();
    store.save(&path, &doc).unwrap();
    let first = std::fs::read(&path).unwrap();

    let doc = store.load(&path).unwrap();
    store.save(&path, &doc).unwrap();
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_saved_bytes_are_gbk() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", SAMPLE);
    let store = DocumentStore::new();

    let doc = store.load(&path).unwrap();
    store.save(&path, &doc).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(std::str::from_utf8(&bytes).is_err());

    let loaded = store.open(&path).unwrap();
    assert_eq!(loaded.encoding, SourceEncoding::Legacy);
    assert_eq!(loaded.document, doc);
    assert_eq!(
        loaded.document.nested("ItemCfg", "potion"),
        Some(&json!("红色药水"))
    );
}

#[test]
fn test_commented_document_falls_back() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", COMMENTED);

    let doc = DocumentStore::new().load(&path).unwrap();
    assert!(doc.section("Legacy").is_none());
    assert_eq!(doc.section("url"), Some(&json!("http://example.com/a")));
    assert!(doc.path_records().is_empty());
}

#[test]
fn test_malformed_document_keeps_strict_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", "{ \"a\": 1, // 注释\n \"b\": }");

    let err = DocumentStore::new().load(&path).unwrap_err();
    match err {
        ConfigError::MalformedDocument { source, fallback, .. } => {
            assert!(source.is_syntax());
            assert!(!fallback.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_top_level_must_be_object() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", "[1, 2]");

    let err = DocumentStore::new().load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MalformedDocument { .. }));
}

#[test]
fn test_save_refuses_readonly_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", SAMPLE);
    let store = DocumentStore::new();
    let doc = store.load(&path).unwrap();

    store.fs().set_readonly(&path, true).unwrap();
    let err = store.save(&path, &doc).unwrap_err();
    assert!(matches!(err, ConfigError::DocumentReadOnly(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE);

    store.fs().set_readonly(&path, false).unwrap();
}

#[test]
fn test_unmappable_text_is_escaped() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_sample(&temp_dir, "a.ini", SAMPLE);
    let store = DocumentStore::new();

    let doc = store
        .load(&path)
        .unwrap()
        .with_section("Note", json!("Ã©ÂÂ¯å¾\u{84}😀"));
    store.save(&path, &doc).unwrap();

    let reloaded = store.load(&path).unwrap();
    assert_eq!(reloaded, doc);

    // 再次保存字节不变
    let first = std::fs::read(&path).unwrap();
    store.save(&path, &reloaded).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), first);
}

#[test]
fn test_with_nested_replaces_non_object_section() {
    let doc = ConfigDocument::from_value(json!({"BuffCfg": "broken"}))
        .unwrap()
        .with_nested(BUFF_SECTION, BUFF_SPELLS_KEY, json!([]));
    assert_eq!(doc.section(BUFF_SECTION), Some(&json!({"BuffSpells": []})));
}

#[test]
fn test_config_lock_tolerates_bad_shape() {
    let doc = ConfigDocument::from_value(json!({"ConfigLock": {"locked": "yes"}})).unwrap();
    assert!(doc.config_lock().is_none());

    let doc = doc.with_config_lock(&ConfigLock::manual(true)).unwrap();
    let lock = doc.config_lock().unwrap();
    assert!(lock.locked);
    assert_eq!(lock.reason, "manual");
}

#[test]
fn test_open_missing_file() {
    let err = DocumentStore::new()
        .open(Path::new("nonexistent_pss.ini"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
