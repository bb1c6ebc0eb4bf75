//! 运行设置
//!
//! 默认值即可覆盖常见安装；需要时可以从 JSON 文件加载覆盖部分字段。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// 运行设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 相对于根目录的锚点路径段，最后一段是角色目录所在的文件夹
    pub anchor: Vec<String>,
    /// 配置文件扩展名（不区分大小写）
    pub extension: String,
    /// 递归搜索配置文件的最大深度
    pub search_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anchor: vec!["Config".to_string(), "PSS".to_string()],
            extension: crate::DOCUMENT_EXTENSION.to_string(),
            search_depth: 5,
        }
    }
}

impl Settings {
    /// 从 JSON 文件加载设置，缺失字段使用默认值
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 文件名是否带有配置文件扩展名
    pub fn is_document_name(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}
