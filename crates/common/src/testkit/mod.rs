//! Test doubles for the array management API
//!
//! - [`MemoryArray`] implements [`ArrayApi`](crate::array::ArrayApi) over
//!   plain collections and records every call, so reporting and enforcement
//!   can be tested without a live array.
//! - [`FakeArrayServer`] serves a small fixed account over HTTP on an
//!   ephemeral localhost port, for exercising [`ArrayClient`](crate::array::ArrayClient)
//!   and anything that logs in through it.
//!
//! # Example
//!
//! ```rust,ignore
//! use common::testkit::MemoryArray;
//!
//! let array = MemoryArray::new()
//!     .with_bucket("teamA", "b1", 2 << 30)
//!     .with_policy("pure:policy/full-access")
//!     .with_user("teamA/alice", &["pure:policy/full-access"]);
//!
//! let report = common::usage::collect_usage(&array, "teamA").await?;
//! ```
mod memory;
mod server;

pub use memory::{ArrayCall, MemoryArray};
pub use server::{FakeArrayServer, FAKE_API_TOKEN, FAKE_API_VERSION};
