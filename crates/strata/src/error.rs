//! Error types for the grouping engine.

/// Result type alias for grouping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when querying a published grouping.
///
/// These are returned by the `try_` query variants; the plain variants treat
/// the same conditions as precondition violations and panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Item index is outside the published result's source range.
    #[error("item index {index} out of range for source of {count} rows")]
    ItemOutOfRange { index: usize, count: usize },

    /// Group position is outside the published group list.
    #[error("group position {group} out of range ({count} groups)")]
    GroupOutOfRange { group: usize, count: usize },

    /// Position within a group is outside that group's member list.
    #[error("position {position} out of range for group of {count} members")]
    PositionOutOfRange { position: usize, count: usize },

    /// The item exists but belongs to a different group.
    #[error("item {index} is not a member of group {group}")]
    NotAMember { index: usize, group: usize },
}
