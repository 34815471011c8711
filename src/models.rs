pub mod billing;
pub mod customer;
pub mod imports;
pub mod ledger;
