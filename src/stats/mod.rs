//! Year-in-review statistics.
//!
//! [`snapshot::StatSnapshot`] is the immutable fact record every later stage reads. It is either
//! loaded from JSON or produced by [`aggregate::aggregate`] from raw history records, which
//! [`git::GitHistorySource`] collects from a local repository.

pub(crate) mod aggregate;
pub(crate) mod git;
pub(crate) mod history;
pub(crate) mod snapshot;
