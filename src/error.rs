use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 错误大类
///
/// 协作层只需要按大类决定提示方式，具体信息由 `Display` 给出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 目录、文件或路径记录不存在
    NotFound,
    /// 文档无法解析（去注释后仍失败）
    MalformedDocument,
    /// 参数校验失败
    ValidationError,
    /// 乱码修复失败（软错误，只影响显示名称）
    EncodingRecoveryFailed,
    /// 存储边界上的读写或属性切换失败
    IoFailure,
}

/// 变更操作种类，用于给底层错误附加上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// 一键无怪飞
    FlightInjection,
    /// 自动换头盔
    BuffComposition,
    /// 自动施放光箭
    ThresholdSkill,
    /// 锁定
    Lock,
    /// 解锁
    Unlock,
    /// 恢复备份
    Restore,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::FlightInjection => "一键无怪飞",
            MutationKind::BuffComposition => "自动换头盔",
            MutationKind::ThresholdSkill => "自动施放光箭",
            MutationKind::Lock => "锁定配置",
            MutationKind::Unlock => "解锁配置",
            MutationKind::Restore => "恢复备份",
        };
        f.write_str(name)
    }
}

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("目录不存在: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("未找到任何角色目录: {}", .0.display())]
    NoCharactersFound(PathBuf),

    #[error("角色 {character} 下没有配置文件")]
    NoConfigFiles { character: String },

    #[error("未找到挂机路径: {0}")]
    PathNotFound(String),

    #[error("没有可用的备份: {}", .0.display())]
    NoBackupAvailable(PathBuf),

    #[error("配置文件格式错误 {}: {source}（去注释后: {fallback}）", .path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
        fallback: String,
    },

    #[error("缺少必填字段: {0}")]
    MissingRequiredField(&'static str),

    #[error("飞行ID无效: {0:?}（必须是非负整数）")]
    InvalidFlightId(String),

    #[error("强化等级无效: {0}（范围 0-9）")]
    InvalidLevel(u8),

    #[error("文件为只读，拒绝写入: {}", .0.display())]
    DocumentReadOnly(PathBuf),

    #[error("文本无法用 GBK 编码: {0:?}")]
    UnencodableText(char),

    #[error("名称修复失败: {0:?}")]
    EncodingRecoveryFailed(String),

    #[error("IO 错误 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{operation}失败 ({}): {source}", .path.display())]
    Mutation {
        operation: MutationKind,
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// 包装 IO 错误并附带路径
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// 错误大类
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::DirectoryNotFound(_)
            | ConfigError::NoCharactersFound(_)
            | ConfigError::NoConfigFiles { .. }
            | ConfigError::PathNotFound(_)
            | ConfigError::NoBackupAvailable(_) => ErrorKind::NotFound,
            ConfigError::MalformedDocument { .. } | ConfigError::Json(_) => {
                ErrorKind::MalformedDocument
            }
            ConfigError::MissingRequiredField(_)
            | ConfigError::InvalidFlightId(_)
            | ConfigError::InvalidLevel(_) => ErrorKind::ValidationError,
            ConfigError::EncodingRecoveryFailed(_) => ErrorKind::EncodingRecoveryFailed,
            ConfigError::DocumentReadOnly(_)
            | ConfigError::UnencodableText(_)
            | ConfigError::Io { .. } => ErrorKind::IoFailure,
            ConfigError::Mutation { source, .. } => source.kind(),
        }
    }

    /// 给 IO / 解析类错误附加操作上下文；校验类错误原样返回
    pub(crate) fn in_mutation(self, operation: MutationKind, path: &Path) -> Self {
        match self.kind() {
            ErrorKind::IoFailure | ErrorKind::MalformedDocument => ConfigError::Mutation {
                operation,
                path: path.to_path_buf(),
                source: Box::new(self),
            },
            _ => self,
        }
    }

    /// 去掉变更上下文，取得最内层错误
    pub fn root_cause(&self) -> &ConfigError {
        match self {
            ConfigError::Mutation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
