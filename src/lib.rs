pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
pub mod host;
pub mod linker;
pub mod types;
