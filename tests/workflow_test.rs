//! 完整流程测试：发现 → 锁定 → 一键操作 → 备份恢复

use std::fs;
use std::path::{Path, PathBuf};

use pss_config::mutation::flight_steps;
use pss_config::{
    BackupManager, BuffParams, ConfigError, DocumentStore, ErrorKind, FileSystem, LockManager,
    LockState, MutationEngine, PathResolver, RepairOutcome, Settings,
};
use serde_json::json;
use tempfile::TempDir;

const CONFIG: &str = r#"{
  "PathCfg": {
    "pathRecords": [
      {
        "name": "路径：说话之岛码头",
        "attackSteps": [
          {"map": 0, "position": {"x": 32580, "y": 32931}, "type": "PATH"},
          {"map": 0, "position": {"x": 32590, "y": 32940}, "type": "PATH"}
        ]
      },
      {"name": "Â·¾¶1", "attackSteps": []}
    ]
  },
  "BuffCfg": {"enabled": true, "BuffSpells": []},
  "AttackCfg": {"range": 6, "MPSpell": []},
  "ItemCfg": {"potion": "红色药水"}
}"#;

/// 在临时目录中搭建 `<根>/Config/PSS/<角色>/<文件>` 结构
fn setup_character(root: &Path, character: &str, files: &[&str]) -> PathBuf {
    let dir = root.join("Config").join("PSS").join(character);
    fs::create_dir_all(&dir).unwrap();
    for name in files {
        fs::write(dir.join(name), CONFIG).unwrap();
    }
    dir
}

fn single_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let dir = setup_character(temp_dir.path(), "妖精", &["打钱_亚丁.ini"]);
    (temp_dir, dir.join("打钱_亚丁.ini"))
}

#[test]
fn test_discovery_with_duplicated_anchor() {
    let temp_dir = TempDir::new().unwrap();
    setup_character(temp_dir.path(), "骑士", &["a.ini", "b.INI", "notes.txt"]);
    setup_character(temp_dir.path(), "妖精", &["c.ini"]);

    let store = DocumentStore::new();
    let resolver = PathResolver::new(store.fs(), Settings::default());

    let root = temp_dir.path().to_string_lossy().into_owned();
    let characters = resolver.resolve_characters(&root);
    assert!(characters.reason.is_none());
    assert_eq!(characters.items.len(), 2);

    // 用户选到了 Config 目录，或路径里多了一层 Config
    let inside = format!("{}/Config", root);
    let doubled = format!("{}/Config/Config/PSS", root);
    assert_eq!(resolver.anchor_dir(&inside), resolver.anchor_dir(&root));
    assert_eq!(resolver.anchor_dir(&doubled), resolver.anchor_dir(&root));

    let documents = resolver.resolve_documents(&doubled, "骑士");
    let names: Vec<_> = documents.items.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.ini", "b.INI"]);
}

#[test]
fn test_discovery_on_doubled_anchor_folder() {
    let temp_dir = TempDir::new().unwrap();
    let doubled = temp_dir.path().join("Config").join("Config").join("PSS").join("骑士");
    fs::create_dir_all(&doubled).unwrap();
    fs::write(doubled.join("a.ini"), CONFIG).unwrap();

    let store = DocumentStore::new();
    let resolver = PathResolver::new(store.fs(), Settings::default());
    let root = temp_dir.path().to_string_lossy().into_owned();

    for input in [root.clone(), format!("{}/Config/Config/PSS", root)] {
        let characters = resolver.resolve_characters(&input);
        assert!(characters.reason.is_none(), "{}", input);
        assert_eq!(characters.items.len(), 1);
        assert_eq!(characters.items[0].name, "骑士");

        let documents = resolver.resolve_documents(&input, "骑士");
        assert_eq!(documents.items.len(), 1);
        assert!(store.load(&documents.items[0].path).is_ok());
    }
}

#[test]
fn test_discovery_reasons() {
    let temp_dir = TempDir::new().unwrap();
    let store = DocumentStore::new();
    let resolver = PathResolver::new(store.fs(), Settings::default());
    let root = temp_dir.path().to_string_lossy().into_owned();

    let missing = resolver.resolve_characters(&root);
    assert!(missing.is_empty());
    assert!(matches!(missing.reason, Some(ConfigError::DirectoryNotFound(_))));

    fs::create_dir_all(temp_dir.path().join("Config").join("PSS")).unwrap();
    let none = resolver.resolve_characters(&root);
    assert!(matches!(none.reason, Some(ConfigError::NoCharactersFound(_))));

    setup_character(temp_dir.path(), "法师", &[]);
    let no_files = resolver.resolve_documents(&root, "法师");
    assert!(matches!(no_files.reason, Some(ConfigError::NoConfigFiles { .. })));
}

#[test]
fn test_lock_then_unlock_only_touches_lock_record() {
    let (_temp_dir, file) = single_file();
    let store = DocumentStore::new();
    let before = store.load(&file).unwrap();

    let manager = LockManager::new(&store);
    let locked = manager.lock(&file).unwrap();
    assert_eq!(locked.lock_state, LockState::Locked);
    assert!(store.fs().is_readonly(&file).unwrap());

    let unlocked = manager.unlock(&file).unwrap();
    assert_eq!(unlocked.lock_state, LockState::Unlocked);
    assert!(!store.fs().is_readonly(&file).unwrap());

    let after = unlocked.document;
    let lock = after.config_lock().unwrap();
    assert!(!lock.locked);
    assert_eq!(lock.reason, "manual");

    // 除 ConfigLock 外所有段不变
    for name in before.section_names() {
        assert_eq!(after.section(name), before.section(name), "{}", name);
    }
    assert_eq!(after.section_names().count(), before.section_names().count() + 1);

    // 解锁后可以直接写入
    store.save(&file, &after).unwrap();
}

#[test]
fn test_backup_restore_is_byte_identical() {
    let (_temp_dir, file) = single_file();
    let original = fs::read(&file).unwrap();

    let store = DocumentStore::new();
    let backups = BackupManager::new(&store);
    let name = backups.backup(&file).unwrap();
    assert!(name.starts_with("打钱_亚丁.ini.backup."));

    fs::write(&file, "{ 损坏").unwrap();
    assert_eq!(store.load(&file).unwrap_err().kind(), ErrorKind::MalformedDocument);

    let loaded = backups.restore(&file).unwrap();
    assert_eq!(fs::read(&file).unwrap(), original);
    assert_eq!(loaded.lock_state, LockState::Unlocked);
}

#[test]
fn test_restore_reapplies_recorded_lock() {
    let (_temp_dir, file) = single_file();
    let store = DocumentStore::new();

    LockManager::new(&store).lock(&file).unwrap();
    let backups = BackupManager::new(&store);
    backups.backup(&file).unwrap();

    LockManager::new(&store).unlock(&file).unwrap();
    let loaded = backups.restore(&file).unwrap();
    assert_eq!(loaded.lock_state, LockState::Locked);

    LockManager::new(&store).unlock(&file).unwrap();
}

#[test]
fn test_invalid_flight_id_leaves_file_untouched() {
    let (_temp_dir, file) = single_file();
    let store = DocumentStore::new();
    LockManager::new(&store).lock(&file).unwrap();
    let before = fs::read(&file).unwrap();

    let err = MutationEngine::new(&store)
        .inject_flight(&file, "路径：说话之岛码头", "40a")
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidFlightId(_)));
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    // 文件内容和只读属性都不变
    assert_eq!(fs::read(&file).unwrap(), before);
    assert!(store.fs().is_readonly(&file).unwrap());

    LockManager::new(&store).unlock(&file).unwrap();
}

#[test]
fn test_flight_on_locked_file_recommends_relock() {
    let (_temp_dir, file) = single_file();
    let store = DocumentStore::new();
    LockManager::new(&store).lock(&file).unwrap();

    let outcome = MutationEngine::new(&store)
        .inject_flight(&file, "路径：说话之岛码头", "40100")
        .unwrap();
    assert!(outcome.notice.was_readonly);
    assert!(outcome.notice.relock_recommended);
    assert_eq!(outcome.loaded.lock_state, LockState::EditingLocked);

    let record = &outcome.loaded.document.path_records()[0];
    let expected = serde_json::to_value(flight_steps(
        0,
        pss_config::document::Position { x: 32580, y: 32931 },
        40100,
    ))
    .unwrap();
    assert_eq!(record["attackSteps"], expected);
    assert_eq!(record["name"], json!("路径：说话之岛码头"));

    let relocked = LockManager::new(&store).lock(&file).unwrap();
    assert_eq!(relocked.lock_state, LockState::Locked);
    LockManager::new(&store).unlock(&file).unwrap();
}

#[test]
fn test_failed_lookup_keeps_locked_file_readonly() {
    let (_temp_dir, file) = single_file();
    let store = DocumentStore::new();
    LockManager::new(&store).lock(&file).unwrap();
    let before = fs::read(&file).unwrap();

    let err = MutationEngine::new(&store)
        .inject_flight(&file, "不存在", "7")
        .unwrap_err();
    assert!(matches!(err.root_cause(), ConfigError::PathNotFound(_)));

    assert!(store.fs().is_readonly(&file).unwrap());
    assert_eq!(LockManager::new(&store).status(&file).unwrap(), LockState::Locked);
    assert_eq!(fs::read(&file).unwrap(), before);

    LockManager::new(&store).unlock(&file).unwrap();
}

#[test]
fn test_mutations_keep_unrepairable_names() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.ini");
    let document = json!({
        "PathCfg": {
            "pathRecords": [
                {"name": "路径A", "attackSteps": []},
                {"name": "Ã©ÂÂ¯å¾\u{84}", "attackSteps": []}
            ]
        }
    });
    fs::write(&file, serde_json::to_string_pretty(&document).unwrap()).unwrap();

    let store = DocumentStore::new();
    let engine = MutationEngine::new(&store);
    engine.inject_flight(&file, "路径A", "7").unwrap();
    let outcome = engine.bind_mp_spell(&file).unwrap();

    let records = outcome.loaded.document.path_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["name"], json!("Ã©ÂÂ¯å¾\u{84}"));
    assert_eq!(outcome.loaded.document.mp_spells().len(), 2);
}

#[test]
fn test_flight_matches_repaired_name() {
    let (_temp_dir, file) = single_file();
    let store = DocumentStore::new();
    let engine = MutationEngine::new(&store);

    let records = engine.path_records(&file).unwrap();
    assert_eq!(records[1].display_name, "路径1");
    assert_eq!(records[1].outcome, RepairOutcome::Recovered);

    let outcome = engine.inject_flight(&file, "路径1", "7").unwrap();
    let steps = outcome.loaded.document.path_records()[1]["attackSteps"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(steps, 3);

    let err = engine.inject_flight(&file, "不存在", "7").unwrap_err();
    assert!(matches!(err.root_cause(), ConfigError::PathNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_buffs_require_afk_helmet() {
    let (_temp_dir, file) = single_file();
    let before = fs::read(&file).unwrap();
    let store = DocumentStore::new();

    let params = BuffParams {
        afk_helmet: "  ".to_string(),
        ..BuffParams::default()
    };
    let err = MutationEngine::new(&store)
        .compose_buffs(&file, &params)
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingRequiredField("afk_helmet")));
    assert_eq!(fs::read(&file).unwrap(), before);
}

#[test]
fn test_buffs_and_mp_spell_replace_whole_lists() {
    let (_temp_dir, file) = single_file();
    let store = DocumentStore::new();
    let engine = MutationEngine::new(&store);

    let params = BuffParams {
        strength_level: 7,
        agility_level: 0,
        afk_helmet: "+5魔法抵抗头盔".to_string(),
        agility_retrigger: true,
    };
    let first = engine.compose_buffs(&file, &params).unwrap();
    let second = engine.compose_buffs(&file, &params).unwrap();
    assert_eq!(first.loaded.document, second.loaded.document);

    let slots = second.loaded.document.buff_slots();
    assert_eq!(slots.len(), 7);
    assert_eq!(slots[0].slot.text, "+7力量头盔");
    assert_eq!(slots[2].slot.text, "敏捷头盔");
    assert_eq!(slots[6].slot.text, "+5魔法抵抗头盔");
    assert_eq!(
        second.loaded.document.nested("BuffCfg", "enabled"),
        Some(&json!(true))
    );

    let outcome = engine.bind_mp_spell(&file).unwrap();
    let document = outcome.loaded.document;
    assert_eq!(document.mp_spells().len(), 2);
    assert_eq!(document.nested("AttackCfg", "range"), Some(&json!(6)));
    assert_eq!(document.buff_slots(), slots);
    assert!(!outcome.notice.relock_recommended);
}

#[test]
fn test_invalid_level_is_rejected_before_io() {
    let (_temp_dir, file) = single_file();
    let before = fs::read(&file).unwrap();
    let store = DocumentStore::new();

    let params = BuffParams {
        strength_level: 10,
        afk_helmet: "挂机头盔".to_string(),
        ..BuffParams::default()
    };
    let err = MutationEngine::new(&store)
        .compose_buffs(&file, &params)
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLevel(10)));
    assert_eq!(fs::read(&file).unwrap(), before);
}

#[test]
fn test_mutation_on_malformed_document_reports_operation() {
    let (_temp_dir, file) = single_file();
    fs::write(&file, "{ \"PathCfg\": ").unwrap();
    let store = DocumentStore::new();

    let err = MutationEngine::new(&store).bind_mp_spell(&file).unwrap_err();
    assert!(matches!(err, ConfigError::Mutation { .. }));
    assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    assert_eq!(fs::read(&file).unwrap(), b"{ \"PathCfg\": ");
}
