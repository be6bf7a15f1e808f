//! Project-specific utilities live here.

use time::OffsetDateTime;

pub use bookshelf_http::error::format_timestamp;

/// Current UTC time as stored on records, e.g. `2024-01-02T03:04:05.678Z`.
/// Error envelopes carry the same form.
pub fn timestamp_now() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

/// Fresh time-ordered identifier for a comment.
pub fn new_comment_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
