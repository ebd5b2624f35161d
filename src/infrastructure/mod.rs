pub mod config;
pub mod error;
pub mod state_repository;
pub mod storage;
