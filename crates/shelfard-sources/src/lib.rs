//! Payload sources for schema snapshots
//!
//! A source fetches a JSON payload and infers its root column. The CLI only
//! needs [`SchemaSource`], so new kinds of endpoint slot in without touching it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use shelfard_sources::{RestEndpointReader, SchemaSource};
//!
//! let reader = RestEndpointReader::new("https://api.example.com/users/1")?;
//! let root = reader.fetch_schema().await?;
//! ```

pub mod adapter;
pub mod mock;
pub mod rest;

pub use adapter::{FetchError, SchemaSource};
pub use mock::MockSource;
pub use rest::{parse_header_args, RestEndpointReader, DEFAULT_TIMEOUT_SECS};
