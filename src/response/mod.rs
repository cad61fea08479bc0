//! Response decoding and normalization.
//!
//! Xero responses arrive as JSON, XML or plain text, wrapped in one of
//! several envelope shapes, with dates in several encodings. This module
//! turns all of them into one navigable model:
//!
//! - [`decode_body`]: raw body to a JSON value
//! - [`ResponseEnvelope`]: shape classification and resource extraction
//! - [`Node`], [`Resource`], [`Collection`]: the schema-less resource tree
//! - [`coerce_timestamp`], [`is_date_field`]: date handling
//!
//! # Example
//!
//! ```rust
//! use xero_api::response::ResponseEnvelope;
//! use serde_json::json;
//!
//! let envelope = ResponseEnvelope::from_value(&json!({
//!     "ProviderName": "My App",
//!     "Pagination": {"page": 1, "pageCount": 1},
//!     "Employees": [{"EmployeeID": "e1", "FirstName": "Ada"}]
//! }));
//!
//! for employee in &envelope {
//!     assert_eq!(employee["firstName"].as_str(), Some("Ada"));
//! }
//! ```

mod decode;
mod envelope;
mod node;
mod timestamp;

pub use decode::{decode, decode_body, xml_to_value, XML_ATTRIBUTES_KEY, XML_TEXT_KEY};
pub use envelope::{ResponseEnvelope, Structure};
pub use node::{Collection, Node, Resource, Scalar};
pub use timestamp::{coerce_timestamp, is_date_field, parse_timestamp};
