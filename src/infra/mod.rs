pub mod decoder;
pub mod queue;
pub mod storage;
