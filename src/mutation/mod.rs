//! 一键操作（引导式变更）
//!
//! 每个操作都按同一流程执行：
//! 参数校验 → 加载 → 内存中整段替换 → 解除只读 → 序列化写回。
//! 只有替换成功后才会改动文件属性，找不到路径记录等失败不会让已锁定的文件变为可写。
//! 是否重新锁定由协作层根据返回的 [`EditNotice`] 决定。
//!
//! 替换逻辑都是 `(ConfigDocument, 参数) -> ConfigDocument` 的纯函数，
//! 任何一步失败都不会写盘。

mod buffs;
mod flight;
mod mp_spell;

use std::path::Path;

use tracing::info;

pub use buffs::{
    compose_buff_slots, helmet_name, with_buffs, BuffParams, Skill, AGILITY_HELMET_BASE,
    AGILITY_SKILL, MAX_ENHANCE_LEVEL, MOVEMENT_SKILL, STRENGTH_HELMET_BASE, STRENGTH_SKILL,
};
pub use flight::{flight_steps, list_path_records, parse_flight_id, with_flight, NamedPathRecord};
pub use mp_spell::{threshold_slots, with_mp_spell, MP_THRESHOLD, THRESHOLD_SKILL};

use crate::document::{ConfigDocument, DocumentStore, LoadedDocument};
use crate::error::{MutationKind, Result};
use crate::io::{FileSystem, LegacyDecoder};
use crate::lock::{EditNotice, LockManager};

/// 变更结果
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// 写回后重新加载的文档
    pub loaded: LoadedDocument,
    /// 打开编辑时的通知（是否需要重新锁定）
    pub notice: EditNotice,
}

/// 变更引擎
pub struct MutationEngine<'a, F: FileSystem, D: LegacyDecoder> {
    store: &'a DocumentStore<F, D>,
}

impl<'a, F: FileSystem, D: LegacyDecoder> MutationEngine<'a, F, D> {
    pub fn new(store: &'a DocumentStore<F, D>) -> Self {
        Self { store }
    }

    /// 执行一次整段替换
    fn run<M>(&self, operation: MutationKind, path: &Path, mutate: M) -> Result<MutationOutcome>
    where
        M: FnOnce(ConfigDocument) -> Result<ConfigDocument>,
    {
        let context = |e: crate::ConfigError| e.in_mutation(operation, path);

        let document = self.store.load(path).map_err(context)?;
        let document = mutate(document).map_err(context)?;

        let notice = LockManager::new(self.store)
            .open_for_edit(path)
            .map_err(context)?;
        self.store.save(path, &document).map_err(context)?;
        let loaded = self.store.open(path).map_err(context)?;

        info!(
            file = %path.display(),
            %operation,
            relock = notice.relock_recommended,
            "一键操作已写入"
        );
        Ok(MutationOutcome { loaded, notice })
    }
}
