// Scan Ingest Core Library
// 上传内容解析库：目录遍历、压缩包展开、语言识别与扫描载荷构建

pub mod archive;
pub mod language;
pub mod loader;
pub mod path;
pub mod payload;
pub mod pipeline;
pub mod source;
pub mod submit;
pub mod walker;

// 重新导出常用类型
pub use archive::{is_archive, ArchiveEntry, ArchiveExpander};
pub use language::classify;
pub use loader::ContentLoader;
pub use path::ResolvedPath;
pub use payload::{ContentRecord, PayloadOverrides, ProjectNaming, ScanPayload, UploadSurface};
pub use pipeline::{IngestionPipeline, PipelineOptions};
pub use source::{DirectoryHandle, Entry, EntryReader, FileHandle, Selection, SelectionEntry};
pub use submit::{HttpSubmitter, ScanSubmitter, SubmissionReceipt};
pub use walker::{Leaf, TreeWalker};

pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum IngestError {
        #[error("Failed to enumerate '{path}': {source}")]
        Traversal {
            path: String,
            #[source]
            source: std::io::Error,
        },

        #[error("Failed to expand archive '{archive}'{}: {source}", entry_suffix(.entry))]
        Archive {
            archive: String,
            entry: Option<String>,
            #[source]
            source: zip::result::ZipError,
        },

        #[error("Failed to read '{path}': {source}")]
        Read {
            path: String,
            #[source]
            source: std::io::Error,
        },

        #[error("Scan submission failed: {0}")]
        Submission(#[from] SubmissionError),
    }

    fn entry_suffix(entry: &Option<String>) -> String {
        entry
            .as_ref()
            .map(|e| format!(" at entry '{}'", e))
            .unwrap_or_default()
    }

    impl IngestError {
        /// Stable label used by the HTTP layer and in logs.
        pub fn kind(&self) -> &'static str {
            match self {
                IngestError::Traversal { .. } => "traversal_error",
                IngestError::Archive { .. } => "archive_error",
                IngestError::Read { .. } => "read_error",
                IngestError::Submission(_) => "submission_error",
            }
        }
    }

    #[derive(Error, Debug)]
    pub enum SubmissionError {
        #[error("transport error: {0}")]
        Transport(#[from] reqwest::Error),

        #[error("scanner responded with status {status}: {body}")]
        Status { status: u16, body: String },
    }

    pub type Result<T> = std::result::Result<T, IngestError>;
}
