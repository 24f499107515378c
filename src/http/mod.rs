//! HTTP client facade and the transport it drives.

mod client;
mod transport;

pub use client::Client;
pub use transport::{ReqwestTransport, Transport};
