mod cache;
mod server;

pub use cache::CacheConfig;
pub use server::ServerConfig;
