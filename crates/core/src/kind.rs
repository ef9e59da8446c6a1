//! Content kinds shared by policy, filtering and storage.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The kinds of moderated content items.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Document,
    Post,
    Announcement,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Document, ContentKind::Post, ContentKind::Announcement];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Document => "document",
            ContentKind::Post => "post",
            ContentKind::Announcement => "announcement",
        }
    }
}

impl core::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "document" | "documents" => Ok(ContentKind::Document),
            "post" | "posts" => Ok(ContentKind::Post),
            "announcement" | "announcements" | "notification" | "notifications" => {
                Ok(ContentKind::Announcement)
            }
            other => Err(DomainError::validation(format!(
                "unknown content type '{other}' (expected document, post or announcement)"
            ))),
        }
    }
}

/// Sub-kind of an announcement.
///
/// A system announcement has no department; a department announcement has one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementScope {
    System,
    Department,
}

impl AnnouncementScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementScope::System => "system",
            AnnouncementScope::Department => "department",
        }
    }
}

impl core::fmt::Display for AnnouncementScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnouncementScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(AnnouncementScope::System),
            "department" => Ok(AnnouncementScope::Department),
            other => Err(DomainError::validation(format!(
                "unknown announcement scope '{other}' (expected system or department)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plural_and_alias_names() {
        assert_eq!("Posts".parse::<ContentKind>().unwrap(), ContentKind::Post);
        assert_eq!("notification".parse::<ContentKind>().unwrap(), ContentKind::Announcement);
        assert!(matches!("video".parse::<ContentKind>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn scope_serializes_lowercase() {
        let json = serde_json::to_string(&AnnouncementScope::System).unwrap();
        assert_eq!(json, "\"system\"");
        assert!("global".parse::<AnnouncementScope>().is_err());
    }
}
