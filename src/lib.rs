//! License Manager - multi-tenant license issuing, validation and usage metering
//!
//! This library provides the license lifecycle engine plus the storage,
//! token and HTTP layers that wrap it.

pub mod config;
pub mod context;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod jwt;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;
pub mod state;
pub mod util;
