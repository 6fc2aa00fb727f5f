/**
 * Management REST client for the storage array.
 *  - Session login/logout
 *  - Bucket, user and access policy endpoints
 *  - The `ArrayApi` seam reporting and enforcement run against
 */
pub mod array;
/**
 * Write revocation for accounts over quota, with
 *  the recovery commands that undo it.
 */
pub mod enforce;
/**
 * Byte counts: quota parsing and human readable
 *  rendering.
 */
pub mod size;
/**
 * Per-account bucket usage reporting.
 */
pub mod usage;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub mod prelude {
    pub use crate::array::{ArrayApi, ArrayClient, ArrayError};
    pub use crate::enforce::{enforce, enforce_with, EnforceError, EnforcementOutcome, RecoveryCommand};
    pub use crate::size::{humanize_bytes, parse_byte_size, ByteSizeError, Quota};
    pub use crate::usage::{collect_usage, UsageReport};
}
