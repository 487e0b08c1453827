use chrono::{DateTime, Utc};

/// Something that happened to stored data.
///
/// Events are facts: immutable once emitted and only ever appended.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "article.updated").
    fn event_type(&self) -> &'static str;

    /// When the change was committed.
    fn occurred_at(&self) -> DateTime<Utc>;
}
