use std::path::Path;

use super::{MutationEngine, MutationOutcome};
use crate::document::{
    to_json, BuffSlot, ConfigDocument, SlotKind, SlotSpec, TriggerCondition, TriggerKind,
    BUFF_SECTION, BUFF_SPELLS_KEY,
};
use crate::error::{ConfigError, MutationKind, Result};
use crate::io::{FileSystem, LegacyDecoder};

/// 技能名称与图标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skill {
    pub name: &'static str,
    pub icon: u32,
}

/// 力量增益技能
pub const STRENGTH_SKILL: Skill = Skill {
    name: "体魄强健术",
    icon: 42,
};

/// 敏捷增益技能
pub const AGILITY_SKILL: Skill = Skill {
    name: "通畅气脉术",
    icon: 26,
};

/// 移动加速技能
pub const MOVEMENT_SKILL: Skill = Skill {
    name: "加速术",
    icon: 43,
};

pub const STRENGTH_HELMET_BASE: &str = "力量头盔";
pub const AGILITY_HELMET_BASE: &str = "敏捷头盔";

/// 最大强化等级
pub const MAX_ENHANCE_LEVEL: u8 = 9;

/// 自动换头盔参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuffParams {
    /// 力量头盔强化等级（0-9）
    pub strength_level: u8,
    /// 敏捷头盔强化等级（0-9）
    pub agility_level: u8,
    /// 挂机头盔的游戏内名称（必填）
    pub afk_helmet: String,
    /// 是否加入敏捷增益消失后的补施条目
    pub agility_retrigger: bool,
}

impl Default for BuffParams {
    fn default() -> Self {
        Self {
            strength_level: 0,
            agility_level: 0,
            afk_helmet: String::new(),
            agility_retrigger: true,
        }
    }
}

/// 头盔显示名称：等级非零时加上 `+N` 前缀
pub fn helmet_name(level: u8, base: &str) -> Result<String> {
    match level {
        0 => Ok(base.to_string()),
        1..=MAX_ENHANCE_LEVEL => Ok(format!("+{}{}", level, base)),
        _ => Err(ConfigError::InvalidLevel(level)),
    }
}

/// 按固定顺序生成增益槽位
///
/// 顺序即优先级：力量头盔 → 力量技能 → 敏捷头盔 → 敏捷技能
/// → （敏捷补施）→ 加速 → 挂机头盔。
pub fn compose_buff_slots(params: &BuffParams) -> Result<Vec<BuffSlot>> {
    let afk_helmet = params.afk_helmet.trim();
    if afk_helmet.is_empty() {
        return Err(ConfigError::MissingRequiredField("afk_helmet"));
    }

    let strength_helmet = helmet_name(params.strength_level, STRENGTH_HELMET_BASE)?;
    let agility_helmet = helmet_name(params.agility_level, AGILITY_HELMET_BASE)?;

    let mut slots = vec![
        BuffSlot {
            condition: buff_missing(STRENGTH_SKILL),
            slot: item(strength_helmet),
        },
        BuffSlot {
            condition: buff_missing(STRENGTH_SKILL),
            slot: skill(STRENGTH_SKILL),
        },
        BuffSlot {
            condition: buff_missing(AGILITY_SKILL),
            slot: item(agility_helmet),
        },
        BuffSlot {
            condition: buff_missing(AGILITY_SKILL),
            slot: skill(AGILITY_SKILL),
        },
    ];

    if params.agility_retrigger {
        slots.push(BuffSlot {
            condition: TriggerCondition {
                operator: "<=".to_string(),
                ..buff_missing(AGILITY_SKILL)
            },
            slot: skill(AGILITY_SKILL),
        });
    }

    slots.push(BuffSlot {
        condition: buff_missing(MOVEMENT_SKILL),
        slot: skill(MOVEMENT_SKILL),
    });
    slots.push(BuffSlot {
        condition: TriggerCondition {
            value: 1,
            operator: ">=".to_string(),
            ..buff_missing(MOVEMENT_SKILL)
        },
        slot: item(afk_helmet.to_string()),
    });

    Ok(slots)
}

/// 整体替换 `BuffCfg.BuffSpells`
pub fn with_buffs(document: ConfigDocument, slots: &[BuffSlot]) -> Result<ConfigDocument> {
    Ok(document.with_nested(BUFF_SECTION, BUFF_SPELLS_KEY, to_json(&slots)?))
}

fn buff_missing(skill: Skill) -> TriggerCondition {
    TriggerCondition {
        kind: TriggerKind::Buff,
        name: Some(skill.name.to_string()),
        value: 0,
        operator: "==".to_string(),
        enabled: true,
    }
}

fn item(text: String) -> SlotSpec {
    SlotSpec {
        text,
        icon: 0,
        kind: SlotKind::Item,
        bless: None,
    }
}

fn skill(skill: Skill) -> SlotSpec {
    SlotSpec {
        text: skill.name.to_string(),
        icon: skill.icon,
        kind: SlotKind::Skill,
        bless: None,
    }
}

impl<'a, F: FileSystem, D: LegacyDecoder> MutationEngine<'a, F, D> {
    /// 一键自动换头盔
    ///
    /// 槽位在任何 IO 之前生成，缺少挂机头盔名称时不会触碰文件。
    pub fn compose_buffs(&self, path: &Path, params: &BuffParams) -> Result<MutationOutcome> {
        let slots = compose_buff_slots(params)?;
        self.run(MutationKind::BuffComposition, path, |document| {
            with_buffs(document, &slots)
        })
    }
}
