use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod date;

/// A resource record, as written to the output sink.
///
/// This is a [`Resource`] stripped of its retry counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub source: String,
    pub title: String,
    /// Parsed from an ISO-8601 string and rendered back as such.
    #[serde(with = "date")]
    pub creation_date: NaiveDateTime,
    pub message: String,
    pub tags: Vec<String>,
    pub author: String,
}

/// A resource in flight.
///
/// The `retries` counter is always lower than the maximum number of attempts while the resource is being processed,
/// and a resource is never put back with the counter it already had.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default)]
    pub retries: u32,
}

impl Resource {
    /// Validate a raw resource body.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, crate::Error> {
        Self::deserialize(value).map_err(crate::Error::InvalidResource)
    }

    /// Strip the retry counter.
    #[inline]
    pub fn into_record(self) -> Record {
        self.record
    }
}

/// The outcome of a single processing attempt.
///
/// Built fresh on every attempt and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResource {
    pub processed: bool,
    pub processing_date: NaiveDateTime,
    pub resource: Resource,
}

impl ProcessedResource {
    /// Create an outcome stamped with the current UTC time.
    pub fn now(processed: bool, resource: Resource) -> Self {
        Self {
            processed,
            processing_date: Utc::now().naive_utc(),
            resource,
        }
    }
}

/// Return a copy of a raw resource body with its retry counter set to `retries`.
///
/// The given body is left untouched. Non-object bodies cannot carry a counter and are returned as is.
pub fn with_retries(value: &serde_json::Value, retries: u32) -> serde_json::Value {
    let mut value = value.clone();

    if let Some(object) = value.as_object_mut() {
        object.insert("retries".to_owned(), retries.into());
    }

    value
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::{json, Value};

    use super::*;

    pub(crate) fn sample_resource() -> Value {
        json!({
            "id": "924c8cfbd9f94155985bf262cf2c3c67",
            "source": "MessagingSystem",
            "title": "Lover",
            "creation_date": "2020-01-01T17:16:52.228009",
            "message": "We can leave the Christmas lights up 'til January.",
            "tags": ["music", "taylor", "pop"],
            "author": "Taylor Swift",
        })
    }

    #[test]
    fn test_resource_defaults_retries() {
        let resource = Resource::from_value(&sample_resource()).unwrap();

        assert_eq!(resource.retries, 0);
        assert_eq!(resource.record.tags, ["music", "taylor", "pop"]);
    }

    #[test]
    fn test_record_serializes_back_to_input() {
        let record = Resource::from_value(&sample_resource()).unwrap().into_record();

        assert_eq!(serde_json::to_value(&record).unwrap(), sample_resource());
    }

    #[test]
    fn test_resource_keeps_retries() {
        let resource = Resource::from_value(&with_retries(&sample_resource(), 2)).unwrap();

        assert_eq!(resource.retries, 2);
    }

    #[test]
    fn test_invalid_resources() {
        let mut missing = sample_resource();
        missing.as_object_mut().unwrap().remove("author");

        let mut bad_date = sample_resource();
        bad_date["creation_date"] = json!("not a date");

        let mut bad_tags = sample_resource();
        bad_tags["tags"] = json!("music");

        for value in [json!({}), json!([]), json!(null), missing, bad_date, bad_tags] {
            let err = Resource::from_value(&value).unwrap_err();
            assert!(err.is_invalid_resource(), "{value} should be invalid");
        }
    }

    #[test]
    fn test_with_retries_copies() {
        let original = sample_resource();
        let copy = with_retries(&original, 1);

        assert!(original.get("retries").is_none());
        assert_eq!(copy["retries"], json!(1));
    }
}
