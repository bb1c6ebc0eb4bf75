/// IO 抽象层模块
///
/// 该模块提供了文件系统与旧编码解码的抽象接口，遵循依赖倒置原则。
/// 核心逻辑只依赖 trait，协作层（CLI、桌面界面、测试）可以注入自己的实现。
///
/// # 架构设计
///
/// - **traits**: 定义 `FileSystem` / `LegacyDecoder` trait 接口
/// - **fs_io**: 基于 `std::fs` 的默认文件系统实现（原子写入）
/// - **legacy**: 基于 `encoding_rs` 的 GBK 解码实现
///
/// # 使用示例
///
/// ```rust,ignore
/// use pss_config::io::{DefaultFileSystem, FileSystem};
///
/// let fs = DefaultFileSystem;
/// let bytes = fs.read_bytes(Path::new("打钱_亚丁.ini"))?;
/// ```
pub mod traits;
pub mod fs_io;
pub mod legacy;

// === 导出 trait 定义 ===
pub use traits::{DirEntry, FileSystem, LegacyDecoder};

// === 导出默认实现 ===
pub use fs_io::DefaultFileSystem;
pub use legacy::GbkDecoder;
