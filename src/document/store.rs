//! 文档存储
//!
//! 负责“字节 ↔ 文档”这一层：读取走 `FileSystem` + `TextCodec`，
//! 解析先严格后宽松（去注释），写出前统一编码为 GBK。

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{strip_comments, ConfigDocument};
use crate::codec::{SourceEncoding, TextCodec};
use crate::error::{ConfigError, Result};
use crate::io::{DefaultFileSystem, FileSystem, GbkDecoder, LegacyDecoder};
use crate::lock::LockState;

/// 一次加载得到的文档会话
///
/// 锁定状态在每次加载时重新计算，不跨会话缓存。
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: ConfigDocument,
    pub lock_state: LockState,
    pub encoding: SourceEncoding,
}

impl LoadedDocument {
    /// 界面上显示的锁定状态：以文件实际的只读属性为准
    pub fn is_locked(&self) -> bool {
        self.lock_state.is_readonly()
    }
}

/// 文档存储
pub struct DocumentStore<F: FileSystem = DefaultFileSystem, D: LegacyDecoder = GbkDecoder> {
    fs: F,
    codec: TextCodec<D>,
}

impl DocumentStore {
    /// 使用默认文件系统与 GBK 解码器
    pub fn new() -> Self {
        Self::with_parts(DefaultFileSystem, GbkDecoder)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem, D: LegacyDecoder> DocumentStore<F, D> {
    /// 注入文件系统与解码器
    pub fn with_parts(fs: F, decoder: D) -> Self {
        Self {
            fs,
            codec: TextCodec::new(decoder),
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn codec(&self) -> &TextCodec<D> {
        &self.codec
    }

    /// 加载文档
    pub fn load(&self, path: &Path) -> Result<ConfigDocument> {
        Ok(self.read(path)?.0)
    }

    /// 加载文档并计算锁定状态
    pub fn open(&self, path: &Path) -> Result<LoadedDocument> {
        let readonly = self.fs.is_readonly(path)?;
        let (document, encoding) = self.read(path)?;
        let lock_state = LockState::derive(readonly, document.config_lock().as_ref());

        debug!(file = %path.display(), ?lock_state, ?encoding, "打开文档");
        Ok(LoadedDocument {
            path: path.to_path_buf(),
            document,
            lock_state,
            encoding,
        })
    }

    /// 保存文档
    ///
    /// 只读文件直接拒绝，不依赖操作系统报错。
    pub fn save(&self, path: &Path, document: &ConfigDocument) -> Result<()> {
        if self.fs.exists(path) && self.fs.is_readonly(path)? {
            return Err(ConfigError::DocumentReadOnly(path.to_path_buf()));
        }

        let bytes = self.render(document)?;
        self.fs.write_bytes(path, &bytes)?;
        debug!(file = %path.display(), len = bytes.len(), "保存文档");
        Ok(())
    }

    /// 把文档编码为待写入的字节
    ///
    /// GBK 无法表示的字符（如未修复的乱码名称）以 `\uXXXX` 转义写出，记录不会丢失。
    pub fn render(&self, document: &ConfigDocument) -> Result<Vec<u8>> {
        let text = document.to_pretty_string()?;
        self.codec.encode_json(&text)
    }

    /// 解析文本：先严格解析，失败后去注释重试
    pub fn parse(&self, path: &Path, text: &str) -> Result<ConfigDocument> {
        let strict_err = match serde_json::from_str(text) {
            Ok(value) => return into_document(path, value),
            Err(e) => e,
        };

        debug!(file = %path.display(), error = %strict_err, "严格解析失败，去注释后重试");
        match serde_json::from_str(&strip_comments(text)) {
            Ok(value) => into_document(path, value),
            Err(fallback) => Err(ConfigError::MalformedDocument {
                path: path.to_path_buf(),
                source: strict_err,
                fallback: fallback.to_string(),
            }),
        }
    }

    fn read(&self, path: &Path) -> Result<(ConfigDocument, SourceEncoding)> {
        let bytes = self.fs.read_bytes(path)?;
        let decoded = self.codec.decode(&bytes);
        let document = self.parse(path, &decoded.text)?;
        Ok((document, decoded.encoding))
    }
}

fn into_document(path: &Path, value: serde_json::Value) -> Result<ConfigDocument> {
    let kind = json_kind(&value);
    ConfigDocument::from_value(value).ok_or_else(|| ConfigError::MalformedDocument {
        path: path.to_path_buf(),
        source: serde::de::Error::custom(format!("顶层必须是对象，实际为 {}", kind)),
        fallback: String::new(),
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
