use std::path::Path;

use serde_json::Value;

use super::{MutationEngine, MutationOutcome};
use crate::codec::{RepairOutcome, TextCodec};
use crate::document::{
    to_json, AttackStep, ConfigDocument, Position, StepKind, ATTACK_STEPS_KEY, PATH_RECORDS_KEY,
    PATH_SECTION,
};
use crate::error::{ConfigError, MutationKind, Result};
use crate::io::{FileSystem, LegacyDecoder};

/// 带显示名称的路径记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPathRecord {
    /// 在 `pathRecords` 中的位置
    pub index: usize,
    /// 文档中的原始名称
    pub raw_name: String,
    /// 修复后的显示名称
    pub display_name: String,
    pub outcome: RepairOutcome,
    pub step_count: usize,
}

/// 列出路径记录，名称经过乱码修复
pub fn list_path_records<D: LegacyDecoder>(
    document: &ConfigDocument,
    codec: &TextCodec<D>,
) -> Vec<NamedPathRecord> {
    document
        .path_records()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let raw_name = record
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let repaired = codec.repair(&raw_name, index);
            let step_count = record
                .get(ATTACK_STEPS_KEY)
                .and_then(Value::as_array)
                .map_or(0, Vec::len);

            NamedPathRecord {
                index,
                raw_name,
                display_name: repaired.text,
                outcome: repaired.outcome,
                step_count,
            }
        })
        .collect()
}

/// 解析飞行卷轴 ID（非负整数）
pub fn parse_flight_id(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidFlightId(input.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| ConfigError::InvalidFlightId(input.to_string()))
}

/// 固定形状的飞行步骤：寻路 → 卷轴传送 → 寻路
pub fn flight_steps(map: i64, position: Position, flight_id: u64) -> Vec<AttackStep> {
    vec![
        AttackStep::path(map, position),
        AttackStep::teleport(map, position, flight_id),
        AttackStep::path(map, position),
    ]
}

/// 用飞行步骤整体替换指定路径记录的攻击步骤
///
/// 按修复后的显示名称或原始名称匹配记录。
pub fn with_flight<D: LegacyDecoder>(
    document: ConfigDocument,
    codec: &TextCodec<D>,
    record_name: &str,
    flight_id: u64,
) -> Result<ConfigDocument> {
    let target = list_path_records(&document, codec)
        .into_iter()
        .find(|r| r.display_name == record_name || r.raw_name == record_name)
        .ok_or_else(|| ConfigError::PathNotFound(record_name.to_string()))?;

    let mut records = document.path_records().to_vec();
    let record = &mut records[target.index];

    let (map, position) = anchor_of(record);
    let steps = to_json(&flight_steps(map, position, flight_id))?;

    match record {
        Value::Object(fields) => {
            fields.insert(ATTACK_STEPS_KEY.to_string(), steps);
        }
        other => {
            let mut fields = serde_json::Map::new();
            fields.insert("name".to_string(), Value::String(target.display_name));
            fields.insert(ATTACK_STEPS_KEY.to_string(), steps);
            *other = Value::Object(fields);
        }
    }

    Ok(document.with_nested(PATH_SECTION, PATH_RECORDS_KEY, Value::Array(records)))
}

/// 取记录中第一个寻路步骤的位置作为锚点
fn anchor_of(record: &Value) -> (i64, Position) {
    record
        .get(ATTACK_STEPS_KEY)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|step| serde_json::from_value::<AttackStep>(step.clone()).ok())
        .find(|step| step.kind == StepKind::Path)
        .map_or((0, Position::default()), |step| (step.map, step.position))
}

impl<'a, F: FileSystem, D: LegacyDecoder> MutationEngine<'a, F, D> {
    /// 一键无怪飞
    ///
    /// ID 校验在任何 IO 之前完成，非法 ID 不会触碰文件。
    pub fn inject_flight(
        &self,
        path: &Path,
        record_name: &str,
        flight_id: &str,
    ) -> Result<MutationOutcome> {
        let id = parse_flight_id(flight_id)?;
        let codec = self.store.codec();
        self.run(MutationKind::FlightInjection, path, |document| {
            with_flight(document, codec, record_name, id)
        })
    }

    /// 列出文档中的路径记录
    pub fn path_records(&self, path: &Path) -> Result<Vec<NamedPathRecord>> {
        let document = self.store.load(path)?;
        Ok(list_path_records(&document, self.store.codec()))
    }
}
