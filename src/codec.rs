//! 文本编解码与乱码修复
//!
//! 配置文件以 GBK 存盘；读取时先按 UTF-8 严格解码，失败再交给旧编码解码器。
//! 结构化字段里的名称如果已经是乱码，则尝试还原出原始字节重新解码，
//! 实在修不好就去掉不安全字符，最后用位置占位名兜底，保证记录不会丢。

use encoding_rs::{GBK, WINDOWS_1252};
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::io::LegacyDecoder;

/// 文档原始字节使用的编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Legacy,
    /// 两种编码都不完全匹配，按 UTF-8 有损解码
    Lossy,
}

/// 解码结果
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: SourceEncoding,
}

/// 名称修复结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// 原本就是干净的
    Clean,
    /// 重新解码成功
    Recovered,
    /// 重新解码失败，去掉了不安全字符
    Sanitized,
    /// 什么都不剩，使用位置占位名
    Placeholder,
}

/// 修复后的名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedName {
    pub text: String,
    pub outcome: RepairOutcome,
}

/// 文本编解码器
pub struct TextCodec<D: LegacyDecoder> {
    decoder: D,
}

impl<D: LegacyDecoder> TextCodec<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// 解码文档原始字节
    pub fn decode(&self, bytes: &[u8]) -> DecodedText {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return DecodedText {
                text: text.trim_start_matches('\u{FEFF}').to_string(),
                encoding: SourceEncoding::Utf8,
            };
        }

        if let Some(text) = self.decoder.decode(bytes) {
            return DecodedText {
                text,
                encoding: SourceEncoding::Legacy,
            };
        }

        warn!(len = bytes.len(), "UTF-8 与 GBK 解码均失败，按有损 UTF-8 处理");
        DecodedText {
            text: String::from_utf8_lossy(bytes).into_owned(),
            encoding: SourceEncoding::Lossy,
        }
    }

    /// 将文本编码为 GBK 字节
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let (bytes, _, unmappable) = GBK.encode(text);
        if unmappable {
            let mut buf = [0u8; 4];
            let ch = text
                .chars()
                .find(|c| GBK.encode(c.encode_utf8(&mut buf)).2)
                .unwrap_or('\u{FFFD}');
            return Err(ConfigError::UnencodableText(ch));
        }
        Ok(bytes.into_owned())
    }

    /// 将 JSON 文本编码为 GBK 字节
    ///
    /// GBK 无法表示的字符改写为 `\uXXXX` 转义。序列化后的 JSON 中非 ASCII 字符
    /// 只会出现在字符串字面量里，转义后解析结果不变。
    pub fn encode_json(&self, json: &str) -> Result<Vec<u8>> {
        let (bytes, _, unmappable) = GBK.encode(json);
        if !unmappable {
            return Ok(bytes.into_owned());
        }
        self.encode(&escape_unmappable(json))
    }

    /// 修复可能是乱码的名称
    ///
    /// # 参数
    /// * `name` - 从文档中读出的名称
    /// * `index` - 记录在列表中的位置（从 0 开始），用于生成占位名
    pub fn repair(&self, name: &str, index: usize) -> RepairedName {
        if name.trim().is_empty() {
            return RepairedName {
                text: placeholder_name(index),
                outcome: RepairOutcome::Placeholder,
            };
        }

        if !is_garbled(name) {
            return RepairedName {
                text: name.to_string(),
                outcome: RepairOutcome::Clean,
            };
        }

        if let Some(text) = self.redecode(name) {
            return RepairedName {
                text,
                outcome: RepairOutcome::Recovered,
            };
        }

        let failure = ConfigError::EncodingRecoveryFailed(name.to_string());
        let stripped: String = name.chars().filter(|&c| is_safe_char(c) && c != '?').collect();
        let stripped = stripped.trim().to_string();

        if stripped.is_empty() {
            let text = placeholder_name(index);
            warn!(%failure, placeholder = %text, "名称无法修复，使用占位名");
            RepairedName {
                text,
                outcome: RepairOutcome::Placeholder,
            }
        } else {
            warn!(%failure, sanitized = %stripped, "名称无法修复，已去除异常字符");
            RepairedName {
                text: stripped,
                outcome: RepairOutcome::Sanitized,
            }
        }
    }

    /// 依次尝试还原原始字节并重新解码，返回第一个干净的结果
    fn redecode(&self, name: &str) -> Option<String> {
        // GBK 字节被当成单字节代码页读取
        if let Some(bytes) = single_byte_bytes(name) {
            if let Some(text) = self.decoder.decode(&bytes).filter(|t| !is_garbled(t)) {
                return Some(text);
            }
        }

        // UTF-8 字节被当成 GBK 读取
        let (bytes, _, unmappable) = GBK.encode(name);
        if !unmappable {
            if let Ok(text) = std::str::from_utf8(&bytes) {
                if text != name && !is_garbled(text) {
                    return Some(text.to_string());
                }
            }
        }

        // 文本本身的字节直接交给旧编码解码
        self.decoder
            .decode(name.as_bytes())
            .filter(|t| t != name && !is_garbled(t))
    }
}

impl Default for TextCodec<crate::io::GbkDecoder> {
    fn default() -> Self {
        Self::new(crate::io::GbkDecoder)
    }
}

/// 把 GBK 无法表示的字符写成 JSON `\u` 转义（超出基本平面的用代理对）
fn escape_unmappable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c.is_ascii() || !GBK.encode(c.encode_utf8(&mut buf)).2 {
            out.push(c);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units).iter() {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}

/// 位置占位名（从 1 开始编号）
pub fn placeholder_name(index: usize) -> String {
    format!("path-{}", index + 1)
}

/// 判断字符串是否为乱码
///
/// 含替换字符、问号，或出现 ASCII 与中日韩文字/标点之外的字符即视为乱码。
pub fn is_garbled(text: &str) -> bool {
    text.chars().any(|c| c == '\u{FFFD}' || c == '?' || !is_safe_char(c))
}

fn is_safe_char(c: char) -> bool {
    matches!(c as u32,
        0x20..=0x7E
        | 0x3000..=0x303F
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xFF01..=0xFF5E)
}

/// 把只含单字节代码页字符的文本还原为字节
fn single_byte_bytes(text: &str) -> Option<Vec<u8>> {
    if text.is_ascii() {
        return None;
    }
    if text.chars().all(|c| (c as u32) <= 0xFF) {
        return Some(text.chars().map(|c| c as u32 as u8).collect());
    }
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        None
    } else {
        Some(bytes.into_owned())
    }
}
