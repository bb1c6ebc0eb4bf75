//! 备份与恢复
//!
//! 备份文件与原文件同目录，命名为 `<原文件名>.backup.<YYYY_MM_DD_HH_MM_SS>`。
//! 同一秒内的多个备份依次追加 `_1`、`_2` 序号，不会互相覆盖。
//! 后缀不是合法时间戳的文件不视为备份。

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::document::{DocumentStore, LoadedDocument};
use crate::error::{ConfigError, MutationKind, Result};
use crate::io::{FileSystem, LegacyDecoder};
use crate::lock::LockManager;

/// 备份文件名中的分隔段
pub const BACKUP_INFIX: &str = ".backup.";

/// 备份时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// 格式化后的时间戳长度
const TIMESTAMP_LEN: usize = "YYYY_MM_DD_HH_MM_SS".len();

/// 备份管理器
pub struct BackupManager<'a, F: FileSystem, D: LegacyDecoder> {
    store: &'a DocumentStore<F, D>,
}

impl<'a, F: FileSystem, D: LegacyDecoder> BackupManager<'a, F, D> {
    pub fn new(store: &'a DocumentStore<F, D>) -> Self {
        Self { store }
    }

    /// 以当前本地时间创建备份，返回备份文件名
    pub fn backup(&self, path: &Path) -> Result<String> {
        self.backup_at(path, chrono::Local::now().naive_local())
    }

    /// 以指定时间创建备份
    ///
    /// 只复制字节，不改变原文件的只读属性。
    pub fn backup_at(&self, path: &Path, at: NaiveDateTime) -> Result<String> {
        let fs = self.store.fs();
        let bytes = fs.read_bytes(path)?;

        let base = snapshot_name(path, at)?;
        let mut name = base.clone();
        let mut counter = 0u32;
        while fs.exists(&sibling(path, &name)) {
            counter += 1;
            name = format!("{}_{}", base, counter);
        }
        fs.write_bytes(&sibling(path, &name), &bytes)?;

        info!(file = %path.display(), snapshot = %name, "已创建备份");
        Ok(name)
    }

    /// 列出备份文件名（从旧到新）
    pub fn list_backups(&self, path: &Path) -> Result<Vec<String>> {
        let prefix = format!("{}{}", file_name(path)?, BACKUP_INFIX);
        let dir = parent_dir(path);

        let mut snapshots: Vec<(NaiveDateTime, u32, String)> = self
            .store
            .fs()
            .list_directory(&dir)?
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| {
                let (at, counter) = parse_snapshot_suffix(entry.name.strip_prefix(&prefix)?)?;
                Some((at, counter, entry.name))
            })
            .collect();
        snapshots.sort();
        Ok(snapshots.into_iter().map(|(_, _, name)| name).collect())
    }

    /// 用最新的备份覆盖原文件并重新加载
    ///
    /// 恢复后按备份中的锁定记录重新设置只读属性。
    pub fn restore(&self, path: &Path) -> Result<LoadedDocument> {
        let latest = self
            .list_backups(path)?
            .pop()
            .ok_or_else(|| ConfigError::NoBackupAvailable(path.to_path_buf()))?;

        self.restore_from(path, &latest)
            .map_err(|e| e.in_mutation(MutationKind::Restore, path))
    }

    fn restore_from(&self, path: &Path, name: &str) -> Result<LoadedDocument> {
        let fs = self.store.fs();
        let bytes = fs.read_bytes(&sibling(path, name))?;

        if fs.exists(path) && fs.is_readonly(path)? {
            fs.set_readonly(path, false)?;
        }
        fs.write_bytes(path, &bytes)?;

        let loaded = LockManager::new(self.store).reconcile(path)?;
        info!(file = %path.display(), snapshot = %name, state = ?loaded.lock_state, "已恢复备份");
        Ok(loaded)
    }
}

/// 备份文件名
pub fn snapshot_name(path: &Path, at: NaiveDateTime) -> Result<String> {
    Ok(format!(
        "{}{}{}",
        file_name(path)?,
        BACKUP_INFIX,
        at.format(TIMESTAMP_FORMAT)
    ))
}

/// 解析备份后缀 `<时间戳>[_<序号>]`
fn parse_snapshot_suffix(suffix: &str) -> Option<(NaiveDateTime, u32)> {
    let stamp = suffix.get(..TIMESTAMP_LEN)?;
    let at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    let counter = match &suffix[TIMESTAMP_LEN..] {
        "" => 0,
        rest => {
            let digits = rest.strip_prefix('_')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()?
        }
    };
    Some((at, counter))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ConfigError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "路径没有文件名"),
            )
        })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    parent_dir(path).join(name)
}
