/// Inbox item identifiers are opaque strings assigned upstream.
pub type ItemId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
