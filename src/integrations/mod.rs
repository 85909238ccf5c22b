pub mod blob_store;
pub mod insights_client;
