//! Core types for Subledger

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubledgerError};

/// The author object attached to a raw feed post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAuthor {
    pub name: String,
}

/// A post as yielded by a feed source, before normalization.
///
/// `created_utc` arrives as float seconds; everything else is an opaque
/// platform-assigned string. `link_flair_text` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub author: RawAuthor,
    pub created_utc: f64,
    pub id: String,
    pub name: String,
    pub selftext: String,
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub link_flair_text: Option<String>,
}

/// The normalized unit of persistence. Immutable once constructed; the
/// archive stores the JSON serialization of this struct alongside its
/// integer timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub author: String,
    pub created_utc: i64,
    pub id: String,
    pub name: String,
    pub selftext: String,
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub link_flair_text: Option<String>,
}

impl PostRecord {
    /// Normalize a raw feed post.
    ///
    /// Coerces the author object to its handle string and truncates the
    /// float timestamp to integer seconds so ordering and equality stay
    /// stable across storage backends. A missing author handle is a
    /// fatal input error, not a feed failure.
    pub fn from_raw(raw: RawPost) -> Result<Self> {
        if raw.author.name.is_empty() {
            return Err(SubledgerError::InvalidInput(format!(
                "post {} has no author handle",
                raw.id
            )));
        }

        Ok(Self {
            author: raw.author.name,
            // Store as int rather than float
            created_utc: raw.created_utc as i64,
            id: raw.id,
            name: raw.name,
            selftext: raw.selftext,
            title: raw.title,
            url: raw.url,
            permalink: raw.permalink,
            link_flair_text: raw.link_flair_text,
        })
    }

    /// Serialize for the record sink.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SubledgerError::InvalidInput(format!("serialization failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw(created_utc: f64) -> RawPost {
        RawPost {
            author: RawAuthor {
                name: "lender42".to_string(),
            },
            created_utc,
            id: "abc123".to_string(),
            name: "t3_abc123".to_string(),
            selftext: "Requesting $100 until Friday".to_string(),
            title: "[REQ] $100".to_string(),
            url: "https://example.com/r/borrow/abc123".to_string(),
            permalink: "/r/borrow/comments/abc123/req_100/".to_string(),
            link_flair_text: Some("REQ".to_string()),
        }
    }

    #[test]
    fn test_normalization_truncates_fractional_timestamp() {
        let record = PostRecord::from_raw(sample_raw(1700000000.73)).unwrap();
        assert_eq!(record.created_utc, 1700000000);
    }

    #[test]
    fn test_normalization_flattens_author() {
        let record = PostRecord::from_raw(sample_raw(1.0)).unwrap();
        assert_eq!(record.author, "lender42");
    }

    #[test]
    fn test_normalization_rejects_empty_author() {
        let mut raw = sample_raw(1.0);
        raw.author.name = String::new();
        let err = PostRecord::from_raw(raw).unwrap_err();
        assert!(matches!(err, SubledgerError::InvalidInput(_)));
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let record = PostRecord::from_raw(sample_raw(1700000000.73)).unwrap();
        let json = record.to_json().unwrap();
        let back: PostRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_absent_flair_survives_round_trip() {
        let mut raw = sample_raw(1.0);
        raw.link_flair_text = None;
        let record = PostRecord::from_raw(raw).unwrap();
        let json = record.to_json().unwrap();
        let back: PostRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.link_flair_text, None);
    }
}
