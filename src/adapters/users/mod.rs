//! User service RPC client.

mod http;

pub use http::HttpUserDirectory;
