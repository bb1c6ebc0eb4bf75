pub mod backup;
pub mod codec;
pub mod document;
pub mod error;
pub mod io;
pub mod lock;
pub mod mutation;
pub mod resolver;
pub mod settings;

// 重新导出主要结构
pub use backup::BackupManager;
pub use codec::{RepairOutcome, RepairedName, SourceEncoding, TextCodec};
pub use document::{ConfigDocument, ConfigLock, DocumentStore, LoadedDocument};
pub use error::{ConfigError, ErrorKind, MutationKind};
pub use io::{DefaultFileSystem, FileSystem, GbkDecoder, LegacyDecoder};
pub use lock::{EditNotice, LockManager, LockState};
pub use mutation::{BuffParams, MutationEngine, MutationOutcome, NamedPathRecord};
pub use resolver::{CharacterEntry, Discovery, DocumentEntry, PathResolver};
pub use settings::Settings;

// 常量定义
pub const DOCUMENT_EXTENSION: &str = "ini";
