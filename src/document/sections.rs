use serde::{Deserialize, Serialize};

/// 坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// 攻击步骤类型
///
/// 未知类型按原字符串保留。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    Path,
    Teleport,
    Other(String),
}

impl From<String> for StepKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PATH" => StepKind::Path,
            "TELEPORT" => StepKind::Teleport,
            _ => StepKind::Other(value),
        }
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Path => "PATH".to_string(),
            StepKind::Teleport => "TELEPORT".to_string(),
            StepKind::Other(value) => value,
        }
    }
}

/// 路径记录中的单个攻击步骤
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackStep {
    #[serde(default)]
    pub map: i64,
    #[serde(default)]
    pub position: Position,
    #[serde(rename = "type")]
    pub kind: StepKind,
    /// 传送步骤的附加文本
    #[serde(rename = "strValue", default, skip_serializing_if = "Option::is_none")]
    pub str_value: Option<String>,
    /// 传送卷轴 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// 祝福标记
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bless: Option<i64>,
}

impl AttackStep {
    /// 普通寻路步骤
    pub fn path(map: i64, position: Position) -> Self {
        Self {
            map,
            position,
            kind: StepKind::Path,
            str_value: None,
            id: None,
            bless: None,
        }
    }

    /// 使用卷轴传送的步骤
    pub fn teleport(map: i64, position: Position, scroll_id: u64) -> Self {
        Self {
            map,
            position,
            kind: StepKind::Teleport,
            str_value: Some(String::new()),
            id: Some(scroll_id),
            bless: Some(0),
        }
    }
}

/// 触发条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerKind {
    /// 增益状态
    Buff,
    /// 魔力百分比
    Mp,
}

/// 触发条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCondition {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    /// 监视的增益名称（魔力阈值条件为空）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: i64,
    pub operator: String,
    pub enabled: bool,
}

/// 槽位类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotKind {
    Item,
    Skill,
    Unknown,
}

/// 槽位内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    /// 显示文本（物品名或技能名）
    pub text: String,
    pub icon: u32,
    #[serde(rename = "type")]
    pub kind: SlotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bless: Option<String>,
}

/// 增益槽位：条件 + 槽位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffSlot {
    pub condition: TriggerCondition,
    pub slot: SlotSpec,
}

/// 文档内嵌的锁定记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLock {
    pub locked: bool,
    pub timestamp: String,
    pub reason: String,
}

impl ConfigLock {
    /// 手动锁定/解锁记录，时间戳取当前本地时间
    pub fn manual(locked: bool) -> Self {
        Self {
            locked,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            reason: "manual".to_string(),
        }
    }
}
