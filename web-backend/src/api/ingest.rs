use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use scan_ingest_core::error::IngestError;
use scan_ingest_core::source::{Entry, MemoryFile, Selection};
use scan_ingest_core::{PayloadOverrides, UploadSurface};
use serde::Deserialize;

use crate::state::AppState;

/// 文本字段的大小上限
const TEXT_FIELD_LIMIT: usize = 1024 * 1024;

#[derive(Deserialize)]
pub struct IngestPathRequest {
    pub path: String,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

pub fn configure_ingest_routes(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/upload", web::post().to(ingest_upload))   // POST /api/ingest/upload
        .route("/path", web::post().to(ingest_path));      // POST /api/ingest/path
}

/// 解析、构建载荷，并提交（或在 dry_run 时直接返回载荷）
async fn execute(
    state: &AppState,
    surface: Option<&str>,
    selection: Selection,
    overrides: PayloadOverrides,
    dry_run: bool,
) -> HttpResponse {
    let surface = match surface {
        Some(raw) => match raw.parse::<UploadSurface>() {
            Ok(surface) => surface,
            Err(e) => {
                return HttpResponse::BadRequest().json(serde_json::json!({ "error": e }));
            }
        },
        None => state.settings.default_surface,
    };

    tracing::info!(
        "Ingesting {} top-level entries for surface {} (dry_run: {})",
        selection.len(),
        surface,
        dry_run
    );

    let pipeline = state.pipeline.with_naming(surface.naming());

    if dry_run {
        return match pipeline.prepare(selection, &overrides).await {
            Ok(payload) => HttpResponse::Ok().json(payload),
            Err(e) => ingest_error_response(&e),
        };
    }

    match pipeline.run(selection, &overrides).await {
        Ok(receipt) => HttpResponse::Ok().json(receipt.body),
        Err(e) => ingest_error_response(&e),
    }
}

fn ingest_error_response(e: &IngestError) -> HttpResponse {
    tracing::error!("Ingestion failed ({}): {}", e.kind(), e);

    let body = serde_json::json!({
        "error": e.to_string(),
        "kind": e.kind()
    });
    match e {
        IngestError::Submission(_) => HttpResponse::BadGateway().json(body),
        _ => HttpResponse::UnprocessableEntity().json(body),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// 上传文件并扫描：`file` 字段的文件名可携带相对路径（如 proj/lib/util.js）
pub async fn ingest_upload(state: web::Data<AppState>, mut payload: Multipart) -> impl Responder {
    let mut selection = Selection::new();
    let mut overrides = PayloadOverrides::default();
    let mut surface: Option<String> = None;
    let mut dry_run = false;
    let mut remaining = state.settings.upload_limit_bytes;

    // 解析 multipart 表单
    loop {
        match payload.try_next().await {
            Ok(Some(mut field)) => {
                let field_name = field.name().unwrap_or("").to_string();
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .filter(|f| !f.is_empty())
                    .map(|f| f.to_string());

                let limit = if filename.is_some() {
                    remaining
                } else {
                    TEXT_FIELD_LIMIT
                };
                let data = match field.bytes(limit).await {
                    Ok(Ok(bytes)) => Vec::from(bytes.as_ref()),
                    Ok(Err(e)) => {
                        tracing::error!("Failed to read field {}: {}", field_name, e);
                        return HttpResponse::BadRequest().json(serde_json::json!({
                            "error": format!("Failed to read field {}: {}", field_name, e)
                        }));
                    }
                    Err(_) => {
                        return HttpResponse::PayloadTooLarge().json(serde_json::json!({
                            "error": format!("Size limit exceeded for field {}", field_name)
                        }));
                    }
                };

                if let Some(filename) = filename {
                    remaining = remaining.saturating_sub(data.len());
                    let base_name = filename
                        .rsplit(['/', '\\'])
                        .next()
                        .unwrap_or(filename.as_str())
                        .to_string();
                    tracing::debug!("Received {} ({} bytes)", filename, data.len());
                    selection.push_with_path(Entry::file(MemoryFile::new(base_name, data)), filename);
                    continue;
                }

                let value = String::from_utf8_lossy(&data).trim().to_string();
                match field_name.as_str() {
                    "surface" if !value.is_empty() => surface = Some(value),
                    "project_id" if !value.is_empty() => overrides.project_id = Some(value),
                    "project_name" if !value.is_empty() => overrides.project_name = Some(value),
                    "dry_run" => dry_run = parse_flag(&value),
                    other => tracing::debug!("Ignoring field: {}", other),
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read multipart field: {}", e);
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "error": format!("Failed to read multipart: {}", e)
                }));
            }
        }
    }

    if selection.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "No files uploaded"
        }));
    }

    execute(&state, surface.as_deref(), selection, overrides, dry_run).await
}

/// 扫描服务器本地的文件或目录，仅限 `INGEST_PATH_ROOT` 之下
pub async fn ingest_path(
    state: web::Data<AppState>,
    req: web::Json<IngestPathRequest>,
) -> impl Responder {
    let req = req.into_inner();

    let Some(root) = state.settings.path_root.as_deref() else {
        tracing::warn!("Rejected path ingestion of {}: INGEST_PATH_ROOT is not set", req.path);
        return HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Path ingestion is disabled"
        }));
    };

    let root = match tokio::fs::canonicalize(root).await {
        Ok(root) => root,
        Err(e) => {
            tracing::error!("INGEST_PATH_ROOT {} is not accessible: {}", root.display(), e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Configured path root is not accessible"
            }));
        }
    };

    // 相对路径按根目录解析；解析符号链接与 `..` 后再检查是否仍在根目录内
    let requested = match tokio::fs::canonicalize(root.join(&req.path)).await {
        Ok(path) => path,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Path not accessible: {}: {}", req.path, e)
            }));
        }
    };
    if !requested.starts_with(&root) {
        tracing::warn!("Rejected path outside {}: {}", root.display(), requested.display());
        return HttpResponse::Forbidden().json(serde_json::json!({
            "error": format!("Path is outside the allowed root: {}", req.path)
        }));
    }

    let entry = match Entry::from_local_path(&requested).await {
        Ok(entry) => entry,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Path not accessible: {}: {}", req.path, e)
            }));
        }
    };

    let overrides = PayloadOverrides {
        project_id: req.project_id,
        project_name: req.project_name,
    };

    execute(
        &state,
        req.surface.as_deref(),
        Selection::new().with(entry),
        overrides,
        req.dry_run,
    )
    .await
}
