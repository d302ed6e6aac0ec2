//! Application services: store contracts and the cache-aside product service.

pub mod error;
pub mod products;
pub mod repos;
