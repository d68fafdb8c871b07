use actix_web::{web, Scope};

pub mod ingest;

pub fn create_api_router() -> Scope {
    web::scope("/api").service(ingest_routes())
}

fn ingest_routes() -> Scope {
    web::scope("/ingest")
        .configure(ingest::configure_ingest_routes)
}
