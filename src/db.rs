pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod import_log_repo;
pub use import_log_repo::ImportLogRepository;
pub mod staging_repo;
pub use staging_repo::StagingRepository;
pub mod ledger_repo;
pub use ledger_repo::LedgerRepository;
