// Loader module - 文件读取

use crate::error::{IngestError, Result};
use crate::language::classify;
use crate::payload::ContentRecord;
use crate::walker::Leaf;

/// 将普通叶子文件读取为 ContentRecord
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentLoader;

impl ContentLoader {
    pub fn new() -> Self {
        Self
    }

    pub async fn load(&self, leaf: &Leaf) -> Result<ContentRecord> {
        if let Some(size) = leaf.handle.size_hint() {
            tracing::trace!("Reading {} ({} bytes on record)", leaf.path, size);
        }

        let bytes = leaf.handle.read().await.map_err(|e| IngestError::Read {
            path: leaf.path.to_string(),
            source: e,
        })?;

        let content = decode_text(leaf.path.as_str(), bytes);
        let language = classify(leaf.path.file_name());

        tracing::debug!("Loaded {} ({}, {} bytes)", leaf.path, language, content.len());

        Ok(ContentRecord::new(leaf.path.to_string(), language, content))
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// UTF-8 解码；去掉开头的 BOM，非法字节按 U+FFFD 替换并保留该文件
pub(crate) fn decode_text(name: &str, mut bytes: Vec<u8>) -> String {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }

    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{} is not valid UTF-8, including it with lossy decoding", name);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
