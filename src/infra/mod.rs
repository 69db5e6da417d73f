// Adapters implementing the application ports

pub mod http_feed;
pub mod http_geocoder;
pub mod memory_store;
pub mod sqlite_store;
