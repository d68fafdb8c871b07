// Path module - 相对路径解析
// 每个叶子的路径 = 祖先目录名 + 自身名字，以 `/` 分隔，只取决于树的形状

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedPath(String);

impl ResolvedPath {
    /// 叶子路径：前缀 + 名字
    pub fn leaf(prefix: &str, name: &str) -> Self {
        Self(format!("{}{}", prefix, name))
    }

    /// 子目录前缀：前缀 + 目录名 + "/"
    pub fn child_prefix(prefix: &str, dir_name: &str) -> String {
        format!("{}{}/", prefix, dir_name)
    }

    /// Normalizes a client-supplied relative path (`webkitRelativePath`,
    /// multipart filename). Backslashes become `/`, empty and `.` segments
    /// are dropped, and a leading `/` is removed. Falls back to `name` when
    /// nothing usable remains.
    pub fn from_relative(relative: Option<&str>, name: &str) -> Self {
        let Some(relative) = relative else {
            return Self(name.to_string());
        };

        let normalized = relative
            .replace('\\', "/")
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/");

        if normalized.is_empty() {
            Self(name.to_string())
        } else {
            Self(normalized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 最后一段（文件名）
    pub fn file_name(&self) -> &str {
        base_name(&self.0)
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
