//! server implementation

mod cors;
mod encoding;
mod handlers;
mod routes;
mod sources;
mod tile_server;
mod utils;

pub use tile_server::*;
pub use utils::Url;
