pub mod catalog;
pub mod config;
pub mod db;
pub mod export;
pub mod images;
pub mod importer;
pub mod models;
pub mod parser;
pub mod remote;
pub mod server;
pub mod sync;
pub mod validation;
