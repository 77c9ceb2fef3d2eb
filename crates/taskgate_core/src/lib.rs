pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod repository;
pub mod service;
pub mod user;
