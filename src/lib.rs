pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod notifications;
pub mod repositories;
pub mod services;
pub mod web;
