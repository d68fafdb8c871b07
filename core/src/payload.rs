// Payload module - 扫描载荷
// 提交给远程扫描服务的数据结构

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const SCAN_TYPE_MANUAL: &str = "manual";

/// 一个源文件：名字、语言与文本内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub language: String,
    pub content: String,
}

impl ContentRecord {
    /// 创建记录并生成新的 id（与路径和内容无关）
    pub fn new(name: impl Into<String>, language: impl Into<String>, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            language: language.into(),
            content,
        }
    }
}

/// 扫描提交的请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPayload {
    pub scan_id: String,
    pub scan_type: String,
    pub project_id: String,
    pub project_name: String,
    pub timestamp: String,
    pub file_contents: Vec<ContentRecord>,
}

impl ScanPayload {
    pub fn build(
        file_contents: Vec<ContentRecord>,
        naming: &ProjectNaming,
        overrides: &PayloadOverrides,
        now: DateTime<Utc>,
    ) -> Self {
        let project_id = overrides
            .project_id
            .clone()
            .unwrap_or_else(|| naming.project_id_at(now));
        let project_name = overrides
            .project_name
            .clone()
            .unwrap_or_else(|| naming.project_name.clone());

        Self {
            scan_id: Uuid::new_v4().to_string(),
            scan_type: SCAN_TYPE_MANUAL.to_string(),
            project_id,
            project_name,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            file_contents,
        }
    }

    pub fn file_count(&self) -> usize {
        self.file_contents.len()
    }
}

/// 调用方提供的项目 id / 名称，优先于默认命名
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadOverrides {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
}

/// 默认项目命名：`{id_prefix}-{毫秒时间戳}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNaming {
    pub id_prefix: String,
    pub project_name: String,
}

impl ProjectNaming {
    pub fn new(id_prefix: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            project_name: project_name.into(),
        }
    }

    pub fn project_id_at(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}", self.id_prefix, now.timestamp_millis())
    }
}

impl Default for ProjectNaming {
    fn default() -> Self {
        UploadSurface::QuickScan.naming()
    }
}

/// The upload widgets of the dashboard, each with its own default project
/// naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadSurface {
    #[default]
    QuickScan,
    LogicBomb,
    ThreadDemo,
}

impl UploadSurface {
    pub fn naming(self) -> ProjectNaming {
        match self {
            UploadSurface::QuickScan => ProjectNaming::new("upload-scan", "Quick Security Scan"),
            UploadSurface::LogicBomb => {
                ProjectNaming::new("logic-bomb-scan", "Logic Bomb Detection Scan")
            }
            UploadSurface::ThreadDemo => ProjectNaming::new("thread-demo", "Thread Demo Scan"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadSurface::QuickScan => "quick-scan",
            UploadSurface::LogicBomb => "logic-bomb",
            UploadSurface::ThreadDemo => "thread-demo",
        }
    }
}

impl fmt::Display for UploadSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadSurface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "quick-scan" => Ok(UploadSurface::QuickScan),
            "logic-bomb" => Ok(UploadSurface::LogicBomb),
            "thread-demo" => Ok(UploadSurface::ThreadDemo),
            other => Err(format!("Unknown upload surface: {}", other)),
        }
    }
}
