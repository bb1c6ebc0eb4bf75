//! 配置文档模型
//!
//! 文档是一个 JSON 对象：顶层键是分区名（`PathCfg`、`BuffCfg`、`AttackCfg`、
//! `ConfigLock` 等），值是任意嵌套的对象/数组。键顺序保持加载时的插入顺序，
//! 未被变更操作触及的键原样写回。
//!
//! 所有修改都是“整段替换”的纯函数：`with_*` 消耗旧文档并返回新文档，
//! 失败时旧文档不受影响。

mod comments;
mod sections;
mod store;

#[cfg(test)]
mod tests;

use serde::Serialize;
use serde_json::{Map, Value};

pub use comments::strip_comments;
pub use sections::{
    AttackStep, BuffSlot, ConfigLock, Position, SlotKind, SlotSpec, StepKind, TriggerCondition,
    TriggerKind,
};
pub use store::{DocumentStore, LoadedDocument};

use crate::error::Result;

/// 路径配置分区
pub const PATH_SECTION: &str = "PathCfg";
/// 路径记录列表键
pub const PATH_RECORDS_KEY: &str = "pathRecords";
/// 路径记录中的攻击步骤键
pub const ATTACK_STEPS_KEY: &str = "attackSteps";
/// 增益配置分区
pub const BUFF_SECTION: &str = "BuffCfg";
/// 增益槽位列表键
pub const BUFF_SPELLS_KEY: &str = "BuffSpells";
/// 攻击配置分区
pub const ATTACK_SECTION: &str = "AttackCfg";
/// 魔力阈值技能列表键
pub const MP_SPELL_KEY: &str = "MPSpell";
/// 锁定记录分区
pub const LOCK_SECTION: &str = "ConfigLock";

/// 配置文档
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

impl ConfigDocument {
    /// 从 JSON 值创建文档，顶层必须是对象
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    /// 转换为 JSON 值
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// 序列化为格式化文本（两空格缩进，保持键顺序）
    pub fn to_pretty_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// 分区名列表（按文档顺序）
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// 获取分区
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// 获取分区下的某个键
    pub fn nested(&self, section: &str, key: &str) -> Option<&Value> {
        self.root.get(section)?.get(key)
    }

    /// 整段替换分区
    pub fn with_section(mut self, name: &str, value: Value) -> Self {
        self.root.insert(name.to_string(), value);
        self
    }

    /// 整段替换分区下的某个键
    ///
    /// 分区不存在或不是对象时，新建一个只含该键的对象。
    pub fn with_nested(mut self, section: &str, key: &str, value: Value) -> Self {
        match self.root.get_mut(section) {
            Some(Value::Object(map)) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                let mut map = Map::new();
                map.insert(key.to_string(), value);
                self.root.insert(section.to_string(), Value::Object(map));
            }
        }
        self
    }

    /// 读取锁定记录
    ///
    /// 记录缺失或形状不对时返回 `None`，按未锁定处理。
    pub fn config_lock(&self) -> Option<ConfigLock> {
        let value = self.root.get(LOCK_SECTION)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// 写入锁定记录
    pub fn with_config_lock(self, lock: &ConfigLock) -> Result<Self> {
        Ok(self.with_section(LOCK_SECTION, to_json(lock)?))
    }

    /// 路径记录列表（原始 JSON）
    pub fn path_records(&self) -> &[Value] {
        match self.nested(PATH_SECTION, PATH_RECORDS_KEY) {
            Some(Value::Array(records)) => records.as_slice(),
            _ => &[],
        }
    }

    /// 增益槽位列表
    pub fn buff_slots(&self) -> Vec<BuffSlot> {
        typed_list(self.nested(BUFF_SECTION, BUFF_SPELLS_KEY))
    }

    /// 魔力阈值技能列表
    pub fn mp_spells(&self) -> Vec<BuffSlot> {
        typed_list(self.nested(ATTACK_SECTION, MP_SPELL_KEY))
    }
}

/// 序列化为 JSON 值
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// 宽松地读取列表，形状不对的条目跳过
fn typed_list<T: serde::de::DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}
