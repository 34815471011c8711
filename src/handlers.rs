pub mod dashboard;
pub mod imports;
pub mod mobile;
pub mod settlements;
pub mod xml_upload;
