//! BuiltWith Client - typed access to the BuiltWith Lists and Keywords APIs.
//!
//! This crate turns typed queries into HTTP requests, classifies the raw
//! responses and normalizes every response format into one page shape.
//!
//! # Features
//!
//! - **Single queries**: validate, send, classify and normalize one request
//! - **Pagination**: pull-based walk over continuation tokens with a page cap
//! - **Batching**: keyword lookups for long domain lists, isolated per chunk
//! - **Parsing**: named fields and UTC timestamps for result records
//! - **Encoders**: write pages back out as json, xml, csv, tsv or txt
//!
//! # Example
//!
//! ```rust,no_run
//! use builtwith_client::{parse, BuiltWithClient, QueryParameters};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads BUILTWITH_API_KEY and the optional config file
//! let client = BuiltWithClient::from_env()?;
//!
//! let query = QueryParameters::technology("Shopify").with_country("US");
//! let mut pages = client.iterate(query, Some(3))?;
//!
//! while let Some(page) = pages.next_page().await {
//!     for record in &page?.results {
//!         let parsed = parse(record);
//!         println!("{:?} since {:?}", parsed.domain, parsed.first_detected);
//!     }
//! }
//! println!("stopped: {:?}", pages.stop_reason());
//! # Ok(())
//! # }
//! ```
//!
//! # Request flow
//!
//! ```text
//! QueryParameters → plan (validate) → Transport::send → classify
//!                                                          ↓
//!                           Page ← normalize (json/xml/csv/tsv/txt)
//! ```
//!
//! Invalid queries never reach the transport. Nothing is retried.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod batch;
pub mod classify;
pub mod encode;
pub mod executor;
pub mod normalize;
pub mod page;
pub mod pagination;
pub mod parser;
pub mod query;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

// Re-export commonly used types
pub use batch::BatchOutcome;
pub use builtwith_core::{BuiltWithError, ErrorKind, OutputFormat, Result};
pub use classify::classify;
pub use encode::encode;
pub use executor::BuiltWithClient;
pub use normalize::normalize;
pub use page::{ContinuationToken, KeywordRecord, Page, ResultRecord, END_OF_RESULTS};
pub use pagination::{StopReason, TechListPages};
pub use parser::{parse, ParsedRecord};
pub use query::{Endpoint, QueryParameters, QueryPlan};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
