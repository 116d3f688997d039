pub mod app;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod omdb;
pub mod ratings;
pub mod search;
pub mod session;
pub mod storage;
pub mod validation;
