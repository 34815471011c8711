//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod imports;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Pipeline de planilha auto-detectável: upload aceita e encosta no
    // staging; o sync explícito reconcilia.
    let import_routes = Router::new()
        .route("/upload", post(handlers::imports::upload))
        .route("/{import_id}/sync", post(handlers::imports::sync))
        .route("/logs", get(handlers::imports::list_logs));

    // Pipeline XML ordenado: clientes -> notas -> recibos.
    let xml_upload_routes = Router::new()
        .route("/status", get(handlers::xml_upload::status))
        .route("/customers", post(handlers::xml_upload::upload_customers))
        .route("/bills", post(handlers::xml_upload::upload_bills))
        .route("/payments", post(handlers::xml_upload::upload_payments))
        .route("/{upload_log_id}/errors", get(handlers::xml_upload::error_report));

    let admin_routes = Router::new()
        .nest("/import", import_routes)
        .nest("/upload", xml_upload_routes)
        .route("/integrity-fix", post(handlers::settlements::integrity_fix))
        .route("/mobile/{request_id}/approve", post(handlers::mobile::approve_link));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/admin", admin_routes)
        .route("/api/dashboard/{customer_id}", get(handlers::dashboard::get_dashboard))
        .route("/api/settlements", post(handlers::settlements::settle_invoice))
        .route("/api/mobile/link-request", post(handlers::mobile::request_link))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
