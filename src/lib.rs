//! PawHaven - REST backend for a pet adoption marketplace
//!
//! This library provides the core functionality for the PawHaven service.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
