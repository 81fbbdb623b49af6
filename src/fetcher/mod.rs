pub mod client;
pub mod latency;
pub mod models;
pub mod transport;

pub use client::ApiClient;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
