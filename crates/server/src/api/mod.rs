pub mod content;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod transcode;
pub mod uploads;

pub use routes::create_router;
