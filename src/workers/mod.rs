pub mod downloader;
pub mod transcoder;
