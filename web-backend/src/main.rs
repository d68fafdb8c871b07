use actix_cors::Cors;
use actix_files::Files;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use anyhow::Result;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod state;

use api::create_api_router;
use config::Settings;
use state::AppState;

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // 加载 .env
    dotenv::dotenv().ok();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scan_ingest_web=debug,scan_ingest_core=info,actix_web=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let bind_address = settings.bind_address.clone();
    let upload_limit = settings.upload_limit_bytes;

    match &settings.path_root {
        Some(root) => tracing::info!("Path ingestion limited to {}", root.display()),
        None => tracing::info!("Path ingestion disabled (INGEST_PATH_ROOT not set)"),
    }

    // 初始化状态
    let state = AppState::new(settings)?;
    let serve_dist = std::path::Path::new("./dist").exists();

    tracing::info!("Scan ingest server listening on {}", bind_address);

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().limit(upload_limit))
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            // API 路由
            .service(create_api_router())
            // 健康检查
            .route("/health", web::get().to(health_check));

        // 静态文件服务
        if serve_dist {
            app.service(Files::new("/", "./dist").index_file("index.html"))
        } else {
            app
        }
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
