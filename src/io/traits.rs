/// IO 抽象层 - trait 定义
///
/// 该模块定义了文件读写与文本解码的抽象接口，支持依赖注入和测试 mock。

use std::path::Path;
use crate::error::Result;

/// 目录条目
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DirEntry {
    /// 条目名称（不含路径）
    pub name: String,
    /// 是否为目录
    pub is_dir: bool,
}

/// 文件系统 trait
///
/// # 职责
/// - 列目录、读写原始字节、切换只读属性
/// - 不负责编解码，也不负责解析
pub trait FileSystem {
    /// 列出目录下的条目
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// 读取文件的原始字节
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// 写入文件
    ///
    /// 写入必须是全有或全无的：失败时原文件内容保持不变。
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// 设置或清除只读属性
    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()>;

    /// 查询只读属性
    fn is_readonly(&self, path: &Path) -> Result<bool>;

    /// 检查文件或目录是否存在
    fn exists(&self, path: &Path) -> bool;
}

/// 旧编码解码能力
///
/// 乱码修复只依赖这个 `decode(bytes) -> text` 契约，不直接依赖任何解码后端。
pub trait LegacyDecoder {
    /// 按旧的双字节编码解码
    ///
    /// # 返回
    /// 解码出现不可映射字节时返回 `None`
    fn decode(&self, bytes: &[u8]) -> Option<String>;
}
