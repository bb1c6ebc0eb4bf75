//! 角色与配置文件发现
//!
//! 根目录由用户选择，角色目录位于 `<根>/Config/PSS/<角色>` 下，
//! 每个角色目录里是若干 `.ini` 配置文件（内容为 JSON）。
//!
//! 这里的“找不到”都不是致命错误：结果为空，并附带一个具体原因，
//! 由协作层决定如何提示。

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::io::FileSystem;
use crate::settings::Settings;

/// 发现结果：条目列表 + 为空时的原因
#[derive(Debug)]
pub struct Discovery<T> {
    pub items: Vec<T>,
    pub reason: Option<ConfigError>,
}

impl<T> Discovery<T> {
    fn found(items: Vec<T>) -> Self {
        Self { items, reason: None }
    }

    fn empty(reason: ConfigError) -> Self {
        Self {
            items: Vec::new(),
            reason: Some(reason),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 角色目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterEntry {
    pub name: String,
    pub path: PathBuf,
}

/// 角色下的配置文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub character: String,
    pub name: String,
    pub path: PathBuf,
}

/// 路径解析器
pub struct PathResolver<'a, F: FileSystem> {
    fs: &'a F,
    settings: Settings,
}

impl<'a, F: FileSystem> PathResolver<'a, F> {
    pub fn new(fs: &'a F, settings: Settings) -> Self {
        Self { fs, settings }
    }

    /// 计算锚点目录（角色目录的父目录）
    ///
    /// 根目录已经位于锚点内部（如 `…/Config` 或 `…/Config/PSS`）时不再重复拼接，
    /// 路径中连续重复的锚点段（如 `Config/Config`）合并为一段。
    /// 只做字符串计算，不访问磁盘。
    pub fn anchor_dir(&self, root: &str) -> PathBuf {
        let mut segments = split_segments(root);
        let anchor = &self.settings.anchor;

        let overlap = overlap_len(&segments.parts, anchor);
        segments.parts.extend(anchor[overlap..].iter().cloned());

        segments.collapse(anchor);
        segments.into_path()
    }

    /// 在磁盘上定位锚点目录
    ///
    /// 依次尝试：按输入原样补全锚点、合并重复段后的路径、锚点首段重复一次的路径
    /// （磁盘上真实存在 `Config/Config/PSS` 的安装）。都不存在时返回合并后的路径。
    pub fn locate_anchor(&self, root: &str) -> PathBuf {
        let canonical = self.anchor_dir(root);
        self.anchor_candidates(root)
            .into_iter()
            .find(|candidate| self.fs.exists(candidate))
            .unwrap_or(canonical)
    }

    fn anchor_candidates(&self, root: &str) -> Vec<PathBuf> {
        let anchor = &self.settings.anchor;
        let literal = split_segments(root);
        let overlap = overlap_len(&literal.parts, anchor);

        let mut joined = literal.clone();
        joined.parts.extend(anchor[overlap..].iter().cloned());

        let mut doubled = Segments {
            prefix: literal.prefix,
            parts: literal.parts[..literal.parts.len() - overlap].to_vec(),
        };
        doubled.parts.extend(anchor.first().cloned());
        doubled.parts.extend(anchor.iter().cloned());

        let mut candidates = Vec::with_capacity(3);
        for path in [joined.into_path(), self.anchor_dir(root), doubled.into_path()] {
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }
        candidates
    }

    /// 列出所有角色
    pub fn resolve_characters(&self, root: &str) -> Discovery<CharacterEntry> {
        let root_path = normalize_path(root, &self.settings.anchor);
        if !self.fs.exists(&root_path) && !self.fs.exists(&split_segments(root).into_path()) {
            return Discovery::empty(ConfigError::DirectoryNotFound(root_path));
        }

        let anchor = self.locate_anchor(root);
        if !self.fs.exists(&anchor) {
            return Discovery::empty(ConfigError::DirectoryNotFound(anchor));
        }

        let entries = match self.fs.list_directory(&anchor) {
            Ok(entries) => entries,
            Err(e) => return Discovery::empty(e),
        };

        let mut characters: Vec<CharacterEntry> = entries
            .into_iter()
            .filter(|entry| entry.is_dir)
            .map(|entry| CharacterEntry {
                path: anchor.join(&entry.name),
                name: entry.name,
            })
            .collect();
        characters.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(anchor = %anchor.display(), count = characters.len(), "发现角色");
        if characters.is_empty() {
            return Discovery::empty(ConfigError::NoCharactersFound(anchor));
        }
        Discovery::found(characters)
    }

    /// 列出某个角色的配置文件
    pub fn resolve_documents(&self, root: &str, character: &str) -> Discovery<DocumentEntry> {
        let dir = self.locate_anchor(root).join(character);
        if !self.fs.exists(&dir) {
            return Discovery::empty(ConfigError::DirectoryNotFound(dir));
        }

        let entries = match self.fs.list_directory(&dir) {
            Ok(entries) => entries,
            Err(e) => return Discovery::empty(e),
        };

        let mut documents: Vec<DocumentEntry> = entries
            .into_iter()
            .filter(|entry| !entry.is_dir && self.settings.is_document_name(&entry.name))
            .map(|entry| DocumentEntry {
                character: character.to_string(),
                path: dir.join(&entry.name),
                name: entry.name,
            })
            .collect();
        documents.sort_by(|a, b| a.name.cmp(&b.name));

        if documents.is_empty() {
            return Discovery::empty(ConfigError::NoConfigFiles {
                character: character.to_string(),
            });
        }
        Discovery::found(documents)
    }

    /// 递归搜索配置文件（一键自动搜索）
    ///
    /// 无法访问的目录跳过并记录警告。
    pub fn search_documents(&self, dir: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        self.search_dir(dir, 0, &mut found);
        found.sort();
        found
    }

    fn search_dir(&self, dir: &Path, depth: usize, found: &mut Vec<PathBuf>) {
        if depth > self.settings.search_depth {
            return;
        }

        let entries = match self.fs.list_directory(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "无法访问目录");
                return;
            }
        };

        for entry in entries {
            let path = dir.join(&entry.name);
            if entry.is_dir {
                self.search_dir(&path, depth + 1, found);
            } else if self.settings.is_document_name(&entry.name) {
                found.push(path);
            }
        }
    }
}

/// 规范化用户输入的路径：统一分隔符并合并重复的锚点段
pub fn normalize_path(input: &str, anchor: &[String]) -> PathBuf {
    let mut segments = split_segments(input);
    segments.collapse(anchor);
    segments.into_path()
}

#[derive(Clone)]
struct Segments {
    prefix: &'static str,
    parts: Vec<String>,
}

impl Segments {
    /// 合并连续重复的锚点段
    fn collapse(&mut self, anchor: &[String]) {
        self.parts.dedup_by(|current, previous| {
            let name = previous.as_str();
            current.eq_ignore_ascii_case(name) && anchor.iter().any(|s| s.eq_ignore_ascii_case(name))
        });
    }

    fn into_path(self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.prefix, self.parts.join("/")))
    }
}

fn split_segments(input: &str) -> Segments {
    let unified = input.trim().replace('\\', "/");
    let prefix = if unified.starts_with("//") {
        "//"
    } else if unified.starts_with('/') {
        "/"
    } else {
        ""
    };

    let parts = unified
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .map(str::to_string)
        .collect();
    Segments { prefix, parts }
}

/// 输入末尾与锚点开头重合的段数
fn overlap_len(parts: &[String], anchor: &[String]) -> usize {
    (1..=anchor.len())
        .rev()
        .find(|&k| ends_with_segments(parts, &anchor[..k]))
        .unwrap_or(0)
}

fn ends_with_segments(parts: &[String], tail: &[String]) -> bool {
    parts.len() >= tail.len()
        && parts[parts.len() - tail.len()..]
            .iter()
            .zip(tail)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}
