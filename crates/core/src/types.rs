/// Scene ids are opaque client-chosen strings (a URL path segment).
pub type SceneId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
