pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod image;
pub mod scratch;
pub mod storage;
