//! Off-thread STL parsing and metrics for the quote page.
//!
//! The request/response protocol ([`messages`]) is the same on every target:
//! native callers drive it through [`WorkerHost`] (one thread per parse,
//! results over a channel, stale generations dropped), the browser build
//! exposes [`dispatch`] to a web worker through `wasm_api`.
//!
//! [`QuoteSession`] sits on top of the host and holds what the quote page
//! shows: the accepted file, its metrics or error code, the pricing
//! selection and the current price breakdown.

pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod host;
pub mod messages;
pub mod session;
pub mod upload;

#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

pub use config::{ConfigError, QuoteConfig, WorkerConfig};
pub use dispatch::{dispatch, DispatchError};
pub use fetch::{FetchError, FileFetcher, FsFetcher, MemoryFetcher, RoutingFetcher};
pub use host::{HostError, JobTicket, WorkerHost};
pub use messages::{WorkerRequest, WorkerResponse};
pub use session::{QuoteSession, SessionState};
pub use upload::{UploadError, UploadLimits};
