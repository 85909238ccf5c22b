pub mod directory_service;
pub mod file_service;
pub mod guard;
pub mod insights_service;
pub mod ranker;
