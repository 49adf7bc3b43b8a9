pub mod asset_service;
pub mod aws;
pub mod bulk_import;
pub mod object_store;
pub mod pacing;
