pub mod directory;
pub mod file;
pub mod snapshot;
