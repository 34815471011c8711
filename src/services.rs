pub mod balance;
pub mod import_service;
pub mod ledger_service;
pub mod mobile_service;
pub mod reconciliation;
pub mod settlement_service;
pub mod xml_upload_service;
