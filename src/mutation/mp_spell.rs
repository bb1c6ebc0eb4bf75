use std::path::Path;

use super::{MutationEngine, MutationOutcome, Skill};
use crate::document::{
    to_json, BuffSlot, ConfigDocument, SlotKind, SlotSpec, TriggerCondition, TriggerKind,
    ATTACK_SECTION, MP_SPELL_KEY,
};
use crate::error::{MutationKind, Result};
use crate::io::{FileSystem, LegacyDecoder};

/// 魔力百分比阈值
pub const MP_THRESHOLD: i64 = 40;

/// 魔力充足时施放的技能
pub const THRESHOLD_SKILL: Skill = Skill {
    name: "光箭",
    icon: 4,
};

/// 两个条目：占位条目 + 魔力 >= 40% 时施放光箭
pub fn threshold_slots() -> Vec<BuffSlot> {
    vec![
        BuffSlot {
            condition: TriggerCondition {
                kind: TriggerKind::Mp,
                name: None,
                value: 0,
                operator: ">=".to_string(),
                enabled: false,
            },
            slot: SlotSpec {
                text: String::new(),
                icon: 0,
                kind: SlotKind::Unknown,
                bless: None,
            },
        },
        BuffSlot {
            condition: TriggerCondition {
                kind: TriggerKind::Mp,
                name: None,
                value: MP_THRESHOLD,
                operator: ">=".to_string(),
                enabled: true,
            },
            slot: SlotSpec {
                text: THRESHOLD_SKILL.name.to_string(),
                icon: THRESHOLD_SKILL.icon,
                kind: SlotKind::Skill,
                bless: None,
            },
        },
    ]
}

/// 整体替换 `AttackCfg.MPSpell`
pub fn with_mp_spell(document: ConfigDocument) -> Result<ConfigDocument> {
    Ok(document.with_nested(ATTACK_SECTION, MP_SPELL_KEY, to_json(&threshold_slots())?))
}

impl<'a, F: FileSystem, D: LegacyDecoder> MutationEngine<'a, F, D> {
    /// 一键自动施放光箭
    pub fn bind_mp_spell(&self, path: &Path) -> Result<MutationOutcome> {
        self.run(MutationKind::ThresholdSkill, path, with_mp_spell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_threshold_slots_shape() {
        let slots = threshold_slots();
        assert_eq!(slots.len(), 2);
        assert!(!slots[0].condition.enabled);
        assert_eq!(slots[0].slot.kind, SlotKind::Unknown);
        assert_eq!(slots[1].condition.value, 40);
        assert_eq!(slots[1].condition.operator, ">=");
        assert_eq!(slots[1].slot.text, "光箭");
    }

    #[test]
    fn test_with_mp_spell_keeps_other_attack_keys() {
        let doc = ConfigDocument::from_value(json!({
            "AttackCfg": {"range": 7, "MPSpell": [{"old": true}]}
        }))
        .unwrap();

        let doc = with_mp_spell(doc).unwrap();
        assert_eq!(doc.mp_spells(), threshold_slots());
        assert_eq!(doc.nested(ATTACK_SECTION, "range"), Some(&json!(7)));

        // 重复执行结果相同
        assert_eq!(with_mp_spell(doc.clone()).unwrap(), doc);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(&threshold_slots()[1]).unwrap();
        assert_eq!(
            value,
            json!({
                "condition": {"type": "MP", "value": 40, "operator": ">=", "enabled": true},
                "slot": {"text": "光箭", "icon": 4, "type": "SKILL"}
            })
        );
    }
}
