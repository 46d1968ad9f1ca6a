//! Omeka DSP HTTP - Remote store clients for omeka-dsp-core
//!
//! - **Omeka**: Paginated item and media listings decoded into `SourceRecord`s
//! - **DSP**: Authentication, lookup, value writes and asset ingest behind `TargetStore`
//! - **Config**: Connection settings for both APIs

pub mod config;
pub mod dsp;
pub mod http;
pub mod omeka;

pub use config::{DspConfig, OmekaConfig};
pub use dsp::DspClient;
pub use http::{HttpClient, HttpError, HttpResponse};
pub use omeka::OmekaClient;
