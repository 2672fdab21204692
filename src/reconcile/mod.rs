//! Reconciliation core shared by every resource adapter
//!
//! # Module Structure
//!
//! - [`id`] - Composite-ID codec and the per-resource ID schemes
//! - [`waiter`] - Polling for eventually-consistent remote states
//! - [`xml`] - XML equivalence used to suppress formatting-only diffs
//! - [`tags`] - Tag diffing and application
//!
//! # Example
//!
//! ```ignore
//! use awsrecon::reconcile::{tags::TagDiff, xml};
//!
//! let diff = TagDiff::between(&current, &desired);
//! assert!(xml::equivalent(r#"<a b="1" c="2"/>"#, r#"<a c="2" b="1"/>"#));
//! ```

pub mod id;
pub mod tags;
pub mod waiter;
pub mod xml;

pub use id::IdScheme;
pub use tags::{TagDiff, TagSet};
pub use waiter::{wait_for, WaitOutcome, WaitSpec};
