//! vitrine: a product catalogue service with a cache-aside layer between the
//! HTTP API and Postgres.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
