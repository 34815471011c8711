// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::db::{
    CustomerRepository, ImportLogRepository, InvoiceRepository, LedgerRepository,
    PaymentRepository, StagingRepository,
};
use crate::services::{
    import_service::ImportService, ledger_service::LedgerService, mobile_service::MobileService,
    reconciliation::ReconciliationEngine, settlement_service::SettlementService,
    xml_upload_service::XmlUploadService,
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub import_service: ImportService,
    pub xml_upload_service: XmlUploadService,
    pub ledger_service: LedgerService,
    pub settlement_service: SettlementService,
    pub mobile_service: MobileService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let invoice_repo = InvoiceRepository::new(db_pool.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());
        let log_repo = ImportLogRepository::new(db_pool.clone());
        let staging_repo = StagingRepository::new(db_pool.clone());
        let ledger_repo = LedgerRepository::new(db_pool.clone());

        let engine = ReconciliationEngine::new(
            customer_repo.clone(),
            invoice_repo.clone(),
            payment_repo.clone(),
        );

        let import_service =
            ImportService::new(staging_repo, log_repo.clone(), engine.clone());
        let xml_upload_service = XmlUploadService::new(log_repo, engine);
        let ledger_service = LedgerService::new(
            customer_repo.clone(),
            invoice_repo.clone(),
            payment_repo.clone(),
            ledger_repo,
        );
        let settlement_service = SettlementService::new(invoice_repo, payment_repo);
        let mobile_service = MobileService::new(customer_repo);

        Ok(Self {
            db_pool,
            import_service,
            xml_upload_service,
            ledger_service,
            settlement_service,
            mobile_service,
        })
    }
}
