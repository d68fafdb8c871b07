// Archive module - 压缩包展开
// 将 zip 叶子展开为其中的文本条目

use crate::error::{IngestError, Result};
use crate::language::{classify, extension_of};
use crate::loader::decode_text;
use crate::payload::ContentRecord;
use crate::walker::Leaf;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

pub const ARCHIVE_EXTENSION: &str = "zip";

/// 压缩包内的一个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub internal_path: String,
    pub content: String,
}

impl ArchiveEntry {
    pub fn into_record(self) -> ContentRecord {
        let language = classify(&self.internal_path);
        ContentRecord::new(self.internal_path, language, self.content)
    }
}

pub fn is_archive(name: &str) -> bool {
    extension_of(name).as_deref() == Some(ARCHIVE_EXTENSION)
}

/// Expands zip leaves into their text entries.
///
/// The central directory is read first; entries are then decompressed one at
/// a time on a blocking worker. Any failure fails the whole archive.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArchiveExpander;

impl ArchiveExpander {
    pub fn new() -> Self {
        Self
    }

    pub async fn expand(&self, leaf: &Leaf) -> Result<Vec<ArchiveEntry>> {
        let archive_name = leaf.path.to_string();

        let bytes = leaf
            .handle
            .read()
            .await
            .map_err(|e| IngestError::Archive {
                archive: archive_name.clone(),
                entry: None,
                source: ZipError::Io(e),
            })?;

        let name = archive_name.clone();
        let entries = tokio::task::spawn_blocking(move || expand_bytes(&name, bytes))
            .await
            .map_err(|e| IngestError::Archive {
                archive: archive_name.clone(),
                entry: None,
                source: ZipError::Io(std::io::Error::other(e)),
            })??;

        tracing::debug!("Expanded archive {} into {} entries", archive_name, entries.len());
        Ok(entries)
    }

    /// 展开并为每个条目生成 ContentRecord
    pub async fn expand_records(&self, leaf: &Leaf) -> Result<Vec<ContentRecord>> {
        Ok(self
            .expand(leaf)
            .await?
            .into_iter()
            .map(ArchiveEntry::into_record)
            .collect())
    }
}

fn expand_bytes(archive_name: &str, bytes: Vec<u8>) -> Result<Vec<ArchiveEntry>> {
    let archive_error = |entry: Option<String>, source: ZipError| IngestError::Archive {
        archive: archive_name.to_string(),
        entry,
        source,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| archive_error(None, e))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| archive_error(None, e))?;

        // 跳过目录条目
        if file.is_dir() {
            continue;
        }

        let internal_path = file.name().to_string();
        // 不按条目声明的大小预分配，该值来自压缩包本身
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| archive_error(Some(internal_path.clone()), ZipError::Io(e)))?;

        let content = decode_text(&internal_path, buf);
        entries.push(ArchiveEntry {
            internal_path,
            content,
        });
    }

    Ok(entries)
}
