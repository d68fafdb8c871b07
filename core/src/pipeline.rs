// Pipeline module - 上传解析流水线
// 选择 -> 叶子文件 -> ContentRecord -> ScanPayload -> 提交

use crate::archive::{is_archive, ArchiveExpander};
use crate::error::Result;
use crate::loader::ContentLoader;
use crate::payload::{ContentRecord, PayloadOverrides, ProjectNaming, ScanPayload};
use crate::source::Selection;
use crate::submit::{ScanSubmitter, SubmissionReceipt};
use crate::walker::{Leaf, TreeWalker};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 同时进行的读取 / 展开数量上限
    pub max_in_flight: usize,
    /// 调用方未提供项目 id / 名称时使用的默认命名
    pub naming: ProjectNaming,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            naming: ProjectNaming::default(),
        }
    }
}

/// Turns one `Selection` into one `ScanPayload` and hands it to the scanner.
///
/// Stateless between calls. Any traversal, read or archive failure aborts
/// the call; no entry is ever skipped.
#[derive(Clone)]
pub struct IngestionPipeline {
    options: PipelineOptions,
    walker: TreeWalker,
    loader: ContentLoader,
    expander: ArchiveExpander,
    submitter: Arc<dyn ScanSubmitter>,
}

impl IngestionPipeline {
    pub fn new(options: PipelineOptions, submitter: Arc<dyn ScanSubmitter>) -> Self {
        let walker = TreeWalker::new(options.max_in_flight);
        Self {
            options,
            walker,
            loader: ContentLoader::new(),
            expander: ArchiveExpander::new(),
            submitter,
        }
    }

    /// 使用另一套默认命名（例如不同的上传入口）
    pub fn with_naming(&self, naming: ProjectNaming) -> Self {
        let mut pipeline = self.clone();
        pipeline.options.naming = naming;
        pipeline
    }

    /// 遍历并读取整个选择，结果按叶子顺序排列
    pub async fn ingest(&self, selection: Selection) -> Result<Vec<ContentRecord>> {
        let start = Instant::now();
        let leaves = self.walker.walk_selection(selection).await?;
        let leaf_count = leaves.len();

        // 并发读取，按输入顺序收集
        let per_leaf: Vec<Vec<ContentRecord>> = stream::iter(leaves)
            .map(|leaf| self.load_leaf(leaf))
            .buffered(self.options.max_in_flight.max(1))
            .try_collect()
            .await?;

        let records: Vec<ContentRecord> = per_leaf.into_iter().flatten().collect();

        tracing::info!(
            "Ingested {} leaves into {} records in {:?}",
            leaf_count,
            records.len(),
            start.elapsed()
        );
        Ok(records)
    }

    async fn load_leaf(&self, leaf: Leaf) -> Result<Vec<ContentRecord>> {
        if is_archive(leaf.path.file_name()) {
            self.expander.expand_records(&leaf).await
        } else {
            Ok(vec![self.loader.load(&leaf).await?])
        }
    }

    pub fn build_payload(
        &self,
        records: Vec<ContentRecord>,
        overrides: &PayloadOverrides,
    ) -> ScanPayload {
        ScanPayload::build(records, &self.options.naming, overrides, chrono::Utc::now())
    }

    /// 解析选择并构建载荷，不提交
    pub async fn prepare(
        &self,
        selection: Selection,
        overrides: &PayloadOverrides,
    ) -> Result<ScanPayload> {
        let records = self.ingest(selection).await?;
        Ok(self.build_payload(records, overrides))
    }

    /// 完整流程：解析、构建载荷并提交一次
    pub async fn run(
        &self,
        selection: Selection,
        overrides: &PayloadOverrides,
    ) -> Result<SubmissionReceipt> {
        let payload = self.prepare(selection, overrides).await?;
        let receipt = self.submitter.submit(&payload).await?;

        tracing::info!(
            "Scan {} for project {} accepted with status {}",
            payload.scan_id,
            payload.project_id,
            receipt.status
        );
        Ok(receipt)
    }
}
