//! Upload side of the analysis webhook: the file wrapper and, behind the
//! `http` feature, the multipart client.

#[cfg(feature = "http")]
pub mod http;
mod upload;

#[cfg(feature = "http")]
pub use http::{WebhookClient, WebhookError};
pub use upload::{Upload, guess_mime};
