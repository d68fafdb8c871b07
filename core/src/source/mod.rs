// Source module - 条目来源
// 定义类文件系统的异步接口：文件句柄、目录句柄与分页读取器

pub mod local;
pub mod memory;

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::sync::Arc;

pub use local::{LocalDirectory, LocalFile};
pub use memory::{MemoryDirectory, MemoryFile};

/// 叶子文件句柄
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// 文件自身的名字（不含父目录）
    fn name(&self) -> &str;

    /// 读取完整字节内容
    async fn read(&self) -> io::Result<Vec<u8>>;

    /// 已知的字节大小，仅用于日志
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

/// 目录句柄
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> &str;

    /// 打开一个新的子条目读取器
    async fn reader(&self) -> io::Result<Box<dyn EntryReader>>;
}

/// Reads the children of one directory in batches.
///
/// Implementations may paginate: callers keep calling `read_entries` until it
/// returns an empty batch, which is the only signal that the directory is
/// exhausted.
#[async_trait]
pub trait EntryReader: Send {
    async fn read_entries(&mut self) -> io::Result<Vec<Entry>>;
}

#[derive(Clone)]
pub enum Entry {
    File(Arc<dyn FileHandle>),
    Directory(Arc<dyn DirectoryHandle>),
}

impl Entry {
    pub fn file<F: FileHandle + 'static>(file: F) -> Self {
        Entry::File(Arc::new(file))
    }

    pub fn directory<D: DirectoryHandle + 'static>(dir: D) -> Self {
        Entry::Directory(Arc::new(dir))
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::File(f) => f.name(),
            Entry::Directory(d) => d.name(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::File(file) => f.debug_tuple("File").field(&file.name()).finish(),
            Entry::Directory(dir) => f.debug_tuple("Directory").field(&dir.name()).finish(),
        }
    }
}

/// 顶层选择项：拖放或文件选择器给出的一个条目
#[derive(Clone, Debug)]
pub struct SelectionEntry {
    pub entry: Entry,
    /// 客户端提供的相对路径（例如浏览器的 webkitRelativePath），只对顶层文件有意义
    pub relative_path: Option<String>,
}

/// 一次上传交互产生的完整选择，只被消费一次
#[derive(Clone, Debug, Default)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(SelectionEntry {
            entry,
            relative_path: None,
        });
    }

    /// 添加一个带相对路径的顶层文件
    pub fn push_with_path(&mut self, entry: Entry, relative_path: impl Into<String>) {
        self.entries.push(SelectionEntry {
            entry,
            relative_path: Some(relative_path.into()),
        });
    }

    pub fn with(mut self, entry: Entry) -> Self {
        self.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SelectionEntry> {
        self.entries
    }
}

impl FromIterator<Entry> for Selection {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for entry in iter {
            selection.push(entry);
        }
        selection
    }
}
