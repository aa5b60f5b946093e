pub mod detection;
pub mod media;
pub mod storage;
