//! idk2
//!
//! Graph node plugin providing two nodes:
//! - `Print With Verbosity`, a print that picks one of seven log channels and
//!   also posts to the on-screen overlay
//! - `HTTP Request`, a latent GET whose completion resumes the graph

pub mod config;
pub mod http;
pub mod nodes;
pub mod overlay;
pub mod print;

pub use config::{ConfigError, HttpConfig, Idk2Config};
pub use nodes::{NodeServices, register_idk2_nodes, resume_http_request};
pub use overlay::{MessageKey, OverlaySink, ScreenOverlay};
pub use print::{
    LogSink, OverlayGate, PrintConfig, PrintParams, PrintSinks, TracingLogSink,
    print_with_raw_verbosity, print_with_verbosity,
};
