pub mod fs;
pub mod http;
pub mod queue;
pub mod storage;
