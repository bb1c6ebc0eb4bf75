/// 文件系统 IO 实现
///
/// 提供基于 `std::fs` 的默认实现。写入走“临时文件 + 重命名”，保证原文件
/// 要么完整替换，要么保持原样。

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use super::traits::{DirEntry, FileSystem};
use crate::error::{ConfigError, Result};

/// 默认的文件系统实现（基于 std::fs）
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFileSystem;

impl FileSystem for DefaultFileSystem {
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path).map_err(|e| ConfigError::io(path, e))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::io(path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.path().is_dir();
            result.push(DirEntry { name, is_dir });
        }

        debug!(dir = %path.display(), count = result.len(), "列出目录");
        Ok(result)
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let bytes = fs::read(path).map_err(|e| ConfigError::io(path, e))?;
        debug!(file = %path.display(), len = bytes.len(), "读取文件");
        Ok(bytes)
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        // 确保父目录存在
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| ConfigError::io(parent, e))?;
        tmp.write_all(bytes).map_err(|e| ConfigError::io(path, e))?;
        tmp.as_file().sync_all().map_err(|e| ConfigError::io(path, e))?;

        // 沿用原文件的权限位，临时文件默认是 0600
        if let Ok(metadata) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| ConfigError::io(path, e))?;
        }

        tmp.persist(path).map_err(|e| ConfigError::io(path, e.error))?;
        debug!(file = %path.display(), len = bytes.len(), "写入文件");
        Ok(())
    }

    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()> {
        let metadata = fs::metadata(path).map_err(|e| ConfigError::io(path, e))?;
        let mut permissions = metadata.permissions();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = permissions.mode();
            let mode = if readonly { mode & !0o222 } else { mode | 0o200 };
            permissions.set_mode(mode);
        }
        #[cfg(not(unix))]
        permissions.set_readonly(readonly);

        fs::set_permissions(path, permissions).map_err(|e| ConfigError::io(path, e))?;
        debug!(file = %path.display(), readonly, "切换只读属性");
        Ok(())
    }

    fn is_readonly(&self, path: &Path) -> Result<bool> {
        let metadata = fs::metadata(path).map_err(|e| ConfigError::io(path, e))?;
        Ok(metadata.permissions().readonly())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
