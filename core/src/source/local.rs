use super::{DirectoryHandle, Entry, EntryReader, FileHandle};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_BATCH_SIZE: usize = 64;

/// 本地磁盘上的文件
#[derive(Clone, Debug)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: Option<u64>,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = file_name_of(&path);
        Self {
            path,
            name,
            size: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    fn size_hint(&self) -> Option<u64> {
        self.size
    }
}

/// 本地磁盘上的目录，按 `batch_size` 分批读取子条目
#[derive(Clone, Debug)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
    batch_size: usize,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = file_name_of(&path);
        Self {
            path,
            name,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reader(&self) -> io::Result<Box<dyn EntryReader>> {
        let inner = tokio::fs::read_dir(&self.path).await?;
        Ok(Box::new(LocalReader {
            inner,
            batch_size: self.batch_size,
        }))
    }
}

struct LocalReader {
    inner: tokio::fs::ReadDir,
    batch_size: usize,
}

#[async_trait]
impl EntryReader for LocalReader {
    async fn read_entries(&mut self) -> io::Result<Vec<Entry>> {
        let mut batch = Vec::new();
        while batch.len() < self.batch_size {
            let Some(dir_entry) = self.inner.next_entry().await? else {
                break;
            };
            batch.push(entry_for(dir_entry.path(), self.batch_size).await?);
        }
        Ok(batch)
    }
}

impl Entry {
    /// 根据本地路径的元数据（跟随符号链接）创建文件或目录条目
    pub async fn from_local_path(path: impl AsRef<Path>) -> io::Result<Entry> {
        entry_for(path.as_ref().to_path_buf(), DEFAULT_BATCH_SIZE).await
    }
}

async fn entry_for(path: PathBuf, batch_size: usize) -> io::Result<Entry> {
    let metadata = tokio::fs::metadata(&path).await?;
    if metadata.is_dir() {
        Ok(Entry::directory(
            LocalDirectory::new(path).with_batch_size(batch_size),
        ))
    } else {
        let mut file = LocalFile::new(path);
        file.size = Some(metadata.len());
        Ok(Entry::file(file))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
