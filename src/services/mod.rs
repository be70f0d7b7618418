pub mod export_service;
pub mod normalize_service;
pub mod submission_store;
