pub mod command;
pub mod error;
pub mod references;
pub mod response;
pub mod upload;
