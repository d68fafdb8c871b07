use super::{DirectoryHandle, Entry, EntryReader, FileHandle};
use async_trait::async_trait;
use std::io;
use std::sync::Arc;

/// 内存中的文件，用于 multipart 上传和测试
#[derive(Clone, Debug)]
pub struct MemoryFile {
    name: String,
    data: Arc<Vec<u8>>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(data.into()),
        }
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.data.as_ref().clone())
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// 内存中的目录。`page_size` 控制每批返回的子条目数量
#[derive(Clone, Debug)]
pub struct MemoryDirectory {
    name: String,
    children: Arc<Vec<Entry>>,
    page_size: usize,
}

impl MemoryDirectory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Arc::new(Vec::new()),
            page_size: usize::MAX,
        }
    }

    pub fn with_entry(mut self, entry: Entry) -> Self {
        Arc::make_mut(&mut self.children).push(entry);
        self
    }

    pub fn with_file(self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.with_entry(Entry::file(MemoryFile::new(name, data)))
    }

    pub fn with_dir(self, dir: MemoryDirectory) -> Self {
        self.with_entry(Entry::directory(dir))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reader(&self) -> io::Result<Box<dyn EntryReader>> {
        Ok(Box::new(MemoryReader {
            children: Arc::clone(&self.children),
            cursor: 0,
            page_size: self.page_size,
        }))
    }
}

struct MemoryReader {
    children: Arc<Vec<Entry>>,
    cursor: usize,
    page_size: usize,
}

#[async_trait]
impl EntryReader for MemoryReader {
    async fn read_entries(&mut self) -> io::Result<Vec<Entry>> {
        let end = self
            .cursor
            .saturating_add(self.page_size)
            .min(self.children.len());
        let batch = self.children[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reader_paginates_until_empty_batch() {
        let dir = MemoryDirectory::new("d")
            .with_file("a", "1")
            .with_file("b", "2")
            .with_file("c", "3")
            .with_page_size(2);

        let mut reader = dir.reader().await.unwrap();
        let first = reader.read_entries().await.unwrap();
        let second = reader.read_entries().await.unwrap();
        let third = reader.read_entries().await.unwrap();

        assert_eq!(first.iter().map(|e| e.name()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(second.iter().map(|e| e.name()).collect::<Vec<_>>(), vec!["c"]);
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn each_reader_starts_from_the_beginning() {
        let dir = MemoryDirectory::new("d").with_file("a", "1");

        let mut first = dir.reader().await.unwrap();
        assert_eq!(first.read_entries().await.unwrap().len(), 1);

        let mut second = dir.reader().await.unwrap();
        assert_eq!(second.read_entries().await.unwrap().len(), 1);
    }
}
