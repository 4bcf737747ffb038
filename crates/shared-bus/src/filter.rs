//! # Topic Filters
//!
//! MQTT-style subscription filters: `presentation/+`, `options/#`, `data/aabbccddeeff`.

use shared_types::{MULTI_LEVEL_WILDCARD, SINGLE_LEVEL_WILDCARD, TOPIC_SEPARATOR};
use thiserror::Error;

/// Errors from parsing a topic filter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Empty filter string.
    #[error("Topic filter is empty")]
    Empty,

    /// `#` used anywhere but as the final level.
    #[error("Multi-level wildcard must be the last level: {0}")]
    MisplacedMultiLevel(String),

    /// A wildcard sharing a level with other characters (e.g. `data+`).
    #[error("Wildcard must occupy a whole level: {0}")]
    PartialWildcard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Level {
    Exact(String),
    Single,
    Multi,
}

/// A parsed subscription filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    raw: String,
    levels: Vec<Level>,
}

impl TopicFilter {
    /// Parse a filter string.
    pub fn parse(filter: &str) -> Result<Self, FilterError> {
        if filter.is_empty() {
            return Err(FilterError::Empty);
        }

        let parts: Vec<&str> = filter.split(TOPIC_SEPARATOR).collect();
        let last = parts.len() - 1;
        let mut levels = Vec::with_capacity(parts.len());

        for (i, part) in parts.iter().enumerate() {
            let level = match *part {
                MULTI_LEVEL_WILDCARD if i == last => Level::Multi,
                MULTI_LEVEL_WILDCARD => {
                    return Err(FilterError::MisplacedMultiLevel(filter.to_string()))
                }
                SINGLE_LEVEL_WILDCARD => Level::Single,
                p if p.contains(MULTI_LEVEL_WILDCARD) || p.contains(SINGLE_LEVEL_WILDCARD) => {
                    return Err(FilterError::PartialWildcard(filter.to_string()))
                }
                p => Level::Exact(p.to_string()),
            };
            levels.push(level);
        }

        Ok(Self {
            raw: filter.to_string(),
            levels,
        })
    }

    /// Filter matching every topic.
    #[must_use]
    pub fn all() -> Self {
        Self {
            raw: MULTI_LEVEL_WILDCARD.to_string(),
            levels: vec![Level::Multi],
        }
    }

    /// Check whether a concrete topic matches this filter.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let mut topic_levels = topic.split(TOPIC_SEPARATOR);

        for level in &self.levels {
            match level {
                Level::Multi => return true,
                Level::Single => {
                    if topic_levels.next().is_none() {
                        return false;
                    }
                }
                Level::Exact(expected) => match topic_levels.next() {
                    Some(actual) if actual == expected => {}
                    _ => return false,
                },
            }
        }

        topic_levels.next().is_none()
    }

    /// The filter as originally written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_wildcard() {
        let filter = TopicFilter::parse("presentation/+").unwrap();
        assert!(filter.matches("presentation/aa:bb:cc:dd:ee:ff"));
        assert!(filter.matches("presentation/"));
        assert!(!filter.matches("presentation"));
        assert!(!filter.matches("presentation/a/b"));
        assert!(!filter.matches("data/aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_multi_level_wildcard() {
        let filter = TopicFilter::parse("options/#").unwrap();
        assert!(filter.matches("options/aabbccddeeff"));
        assert!(filter.matches("options/a/b/c"));
        assert!(!filter.matches("data/aabbccddeeff"));
        assert!(TopicFilter::all().matches("anything/at/all"));
    }

    #[test]
    fn test_exact_filter() {
        let filter = TopicFilter::parse("data/aabbccddeeff").unwrap();
        assert!(filter.matches("data/aabbccddeeff"));
        assert!(!filter.matches("data/aabbccddeefe"));
    }

    #[test]
    fn test_invalid_filters() {
        assert_eq!(TopicFilter::parse(""), Err(FilterError::Empty));
        assert!(matches!(
            TopicFilter::parse("#/data"),
            Err(FilterError::MisplacedMultiLevel(_))
        ));
        assert!(matches!(
            TopicFilter::parse("data+/x"),
            Err(FilterError::PartialWildcard(_))
        ));
    }
}
