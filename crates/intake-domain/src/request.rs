//! Request identifiers

use std::fmt;

/// Identifier for one inbound file's trip through the pipeline
///
/// Backed by a UUIDv7 so identifiers sort by creation time. Used to give
/// concurrently staged files collision-free names and to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u128);

impl RequestId {
    /// Generate a new UUIDv7-based RequestId
    ///
    /// # Examples
    ///
    /// ```
    /// use intake_domain::RequestId;
    ///
    /// let a = RequestId::new();
    /// let b = RequestId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since the Unix epoch encoded in the identifier
    pub fn timestamp_millis(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_and_time_ordered() {
        let first = RequestId::new();
        let second = RequestId::new();
        assert_ne!(first, second);
        assert!(first.timestamp_millis() <= second.timestamp_millis());
    }

    #[test]
    fn test_display_is_hyphenated_uuid() {
        let id = RequestId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
    }
}
