//! 配置锁定
//!
//! 锁定状态由两部分组成：文件的只读属性和文档内嵌的 `ConfigLock` 记录。
//! 每个操作结束时两者一致；只有在编辑已锁定文档的过程中，才会出现
//! “文件可写但记录仍为锁定”的过渡状态。

use std::path::{Path, PathBuf};

use tracing::info;

use crate::document::{ConfigLock, DocumentStore, LoadedDocument};
use crate::error::{ConfigError, MutationKind, Result};
use crate::io::{FileSystem, LegacyDecoder};

/// 锁定状态（每次加载时由只读属性与锁定记录推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// 文件可写，没有锁定记录或记录为未锁定
    Unlocked,
    /// 文件只读，记录为锁定
    Locked,
    /// 文件可写，但记录仍为锁定（正在编辑已锁定的文档）
    EditingLocked,
    /// 文件只读，但没有锁定记录（例如手动设置了只读属性）
    ReadOnlyUnrecorded,
}

impl LockState {
    pub fn derive(readonly: bool, lock: Option<&ConfigLock>) -> Self {
        let recorded = lock.is_some_and(|l| l.locked);
        match (readonly, recorded) {
            (true, true) => LockState::Locked,
            (true, false) => LockState::ReadOnlyUnrecorded,
            (false, true) => LockState::EditingLocked,
            (false, false) => LockState::Unlocked,
        }
    }

    /// 文件当前是否只读
    pub fn is_readonly(&self) -> bool {
        matches!(self, LockState::Locked | LockState::ReadOnlyUnrecorded)
    }

    /// 文档记录是否标记为锁定
    pub fn is_logically_locked(&self) -> bool {
        matches!(self, LockState::Locked | LockState::EditingLocked)
    }

    /// 两个来源是否一致
    pub fn is_consistent(&self) -> bool {
        matches!(self, LockState::Locked | LockState::Unlocked)
    }
}

/// 打开编辑时给协作层的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditNotice {
    pub path: PathBuf,
    /// 打开前文件是只读的，本次已清除只读属性
    pub was_readonly: bool,
    /// 文档记录为锁定，编辑完成后应重新锁定
    pub relock_recommended: bool,
}

/// 锁定管理器
pub struct LockManager<'a, F: FileSystem, D: LegacyDecoder> {
    store: &'a DocumentStore<F, D>,
}

impl<'a, F: FileSystem, D: LegacyDecoder> LockManager<'a, F, D> {
    pub fn new(store: &'a DocumentStore<F, D>) -> Self {
        Self { store }
    }

    /// 打开文档准备编辑
    ///
    /// 文件为只读时清除只读属性。重复调用没有副作用。
    pub fn open_for_edit(&self, path: &Path) -> Result<EditNotice> {
        let fs = self.store.fs();
        let was_readonly = fs.is_readonly(path)?;
        if was_readonly {
            fs.set_readonly(path, false)?;
        }

        // 文档损坏时不影响解除只读，按未锁定处理
        let relock_recommended = self
            .store
            .load(path)
            .map(|doc| doc.config_lock().is_some_and(|l| l.locked))
            .unwrap_or(false);

        if was_readonly {
            info!(
                file = %path.display(),
                relock_recommended,
                "文件已设为可写，编辑完成后请重新锁定"
            );
        }

        Ok(EditNotice {
            path: path.to_path_buf(),
            was_readonly,
            relock_recommended,
        })
    }

    /// 锁定：先写入锁定记录，再设置只读
    pub fn lock(&self, path: &Path) -> Result<LoadedDocument> {
        self.apply(path, true)
            .map_err(|e| e.in_mutation(MutationKind::Lock, path))
    }

    /// 解锁：先清除只读，再写入解锁记录
    pub fn unlock(&self, path: &Path) -> Result<LoadedDocument> {
        self.apply(path, false)
            .map_err(|e| e.in_mutation(MutationKind::Unlock, path))
    }

    /// 文件当前是否只读
    pub fn is_locked(&self, path: &Path) -> Result<bool> {
        self.store.fs().is_readonly(path)
    }

    /// 重新加载并返回当前锁定状态
    pub fn status(&self, path: &Path) -> Result<LockState> {
        Ok(self.store.open(path)?.lock_state)
    }

    /// 让只读属性与文档记录一致（以记录为准）
    ///
    /// 用于恢复备份等整体替换文件内容之后。
    pub fn reconcile(&self, path: &Path) -> Result<LoadedDocument> {
        let loaded = self.store.open(path)?;
        let locked = loaded.lock_state.is_logically_locked();
        if loaded.lock_state.is_readonly() != locked {
            self.store.fs().set_readonly(path, locked)?;
            return self.store.open(path);
        }
        Ok(loaded)
    }

    fn apply(&self, path: &Path, locked: bool) -> Result<LoadedDocument> {
        let fs = self.store.fs();
        if !fs.exists(path) {
            return Err(ConfigError::io(
                path,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        // 写入前文件必须可写
        if fs.is_readonly(path)? {
            fs.set_readonly(path, false)?;
        }

        let document = self
            .store
            .load(path)?
            .with_config_lock(&ConfigLock::manual(locked))?;
        self.store.save(path, &document)?;

        if locked {
            fs.set_readonly(path, true)?;
        }

        let loaded = self.store.open(path)?;
        info!(file = %path.display(), state = ?loaded.lock_state, "锁定状态已更新");
        Ok(loaded)
    }
}
