//! # Topic Categories
//!
//! Inbound topics have exactly two levels: `<category>/<identifier>`.

use serde::{Deserialize, Serialize};
use shared_types::TOPIC_SEPARATOR;
use std::fmt;

/// Message categories the hub subscribes to.
///
/// Matched case-sensitively against the first topic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Node self-registration.
    Presentation,
    /// Sensor telemetry.
    Data,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Presentation, Category::Data];

    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "presentation" => Some(Category::Presentation),
            "data" => Some(Category::Data),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Presentation => "presentation",
            Category::Data => "data",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a topic into `(category, identifier)`.
///
/// Returns `None` unless the topic has exactly two non-empty levels.
#[must_use]
pub fn split_topic(topic: &str) -> Option<(&str, &str)> {
    let mut levels = topic.split(TOPIC_SEPARATOR);
    let category = levels.next()?;
    let identifier = levels.next()?;

    if levels.next().is_some() || category.is_empty() || identifier.is_empty() {
        return None;
    }
    Some((category, identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_topic() {
        assert_eq!(
            split_topic("presentation/aa:bb:cc:dd:ee:ff"),
            Some(("presentation", "aa:bb:cc:dd:ee:ff"))
        );
        assert_eq!(split_topic("presentation"), None);
        assert_eq!(split_topic("presentation/"), None);
        assert_eq!(split_topic("/aabbccddeeff"), None);
        assert_eq!(split_topic("data/aabbccddeeff/extra"), None);
        assert_eq!(split_topic(""), None);
    }

    #[test]
    fn test_category_is_case_sensitive() {
        assert_eq!(Category::from_segment("data"), Some(Category::Data));
        assert_eq!(Category::from_segment("Data"), None);
        assert_eq!(Category::from_segment("options"), None);
        for category in Category::ALL {
            assert_eq!(Category::from_segment(category.as_str()), Some(category));
        }
    }
}
