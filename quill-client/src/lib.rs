//! HTTP clients for the quill backend.
//!
//! [`HttpPersistence`] implements [`quill_sync::PersistenceClient`] over the
//! `/api/posts` REST resource and [`HttpTransform`] implements
//! [`TextTransform`] over `/api/ai`. Both share one [`ClientConfig`].

pub mod config;
pub mod http;
pub mod transform;
pub mod wire;

pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use http::HttpPersistence;
pub use transform::{check_input, clean_title, HttpTransform, TextTransform, MIN_TITLE_SOURCE_CHARS};
