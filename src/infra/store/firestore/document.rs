//! Firestore REST document shapes and their conversion to [`Post`].
//!
//! Firestore wraps every field in a typed value (`{"stringValue": "..."}`).
//! This module is the only place that knows about that encoding.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::domain::posts::Post;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document `{name}` is missing field `{field}`")]
    MissingField { name: String, field: &'static str },
    #[error("document `{name}` has an unreadable date `{value}`")]
    InvalidDate { name: String, value: String },
    #[error("date `{0}` cannot be encoded")]
    Encode(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// One element of a `runQuery` response stream. Progress entries carry no document.
#[derive(Debug, Deserialize)]
pub struct RunQueryItem {
    #[serde(default)]
    pub document: Option<Document>,
}

impl Document {
    /// Trailing path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn to_post(&self) -> Result<Post, DocumentError> {
        let slug = self
            .string("slug")
            .ok_or_else(|| self.missing("slug"))?
            .to_string();
        let title = self
            .string("title")
            .ok_or_else(|| self.missing("title"))?
            .to_string();

        Ok(Post {
            id: Some(self.id().to_string()),
            slug,
            title,
            excerpt: self.string_or_empty("excerpt"),
            author: self.string_or_empty("author"),
            content: self.string_or_empty("content"),
            date: self.date()?,
            image_url: self.string_or_empty("imageUrl"),
            image_hint: self.string_or_empty("imageHint"),
        })
    }

    fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("stringValue")?.as_str()
    }

    fn string_or_empty(&self, field: &str) -> String {
        self.string(field).unwrap_or_default().to_string()
    }

    fn date(&self) -> Result<OffsetDateTime, DocumentError> {
        let value = self.fields.get("date").ok_or_else(|| self.missing("date"))?;
        let raw = value
            .get("timestampValue")
            .or_else(|| value.get("stringValue"))
            .and_then(Value::as_str)
            .ok_or_else(|| self.invalid_date(value.to_string()))?;
        parse_date(raw).ok_or_else(|| self.invalid_date(raw.to_string()))
    }

    fn missing(&self, field: &'static str) -> DocumentError {
        DocumentError::MissingField {
            name: self.name.clone(),
            field,
        }
    }

    fn invalid_date(&self, value: String) -> DocumentError {
        DocumentError::InvalidDate {
            name: self.name.clone(),
            value,
        }
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Typed field map for a create or patch request.
pub fn encode_fields(post: &Post) -> Result<Value, DocumentError> {
    let date = post
        .date
        .format(&Rfc3339)
        .map_err(|err| DocumentError::Encode(err.to_string()))?;

    Ok(json!({
        "fields": {
            "slug": { "stringValue": post.slug },
            "title": { "stringValue": post.title },
            "excerpt": { "stringValue": post.excerpt },
            "author": { "stringValue": post.author },
            "content": { "stringValue": post.content },
            "date": { "timestampValue": date },
            "imageUrl": { "stringValue": post.image_url },
            "imageHint": { "stringValue": post.image_hint },
        }
    }))
}

/// Structured query for every post in `collection`, newest first.
pub fn list_query(collection: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": "date" },
                "direction": "DESCENDING"
            }]
        }
    })
}

/// Structured query for the post whose slug equals `slug`.
pub fn slug_query(collection: &str, slug: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "slug" },
                    "op": "EQUAL",
                    "value": { "stringValue": slug }
                }
            },
            "limit": 1
        }
    })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn document(fields: Value) -> Document {
        serde_json::from_value(json!({
            "name": "projects/studio/databases/(default)/documents/posts/abc123",
            "fields": fields,
            "createTime": "2024-01-01T00:00:00Z",
        }))
        .expect("document")
    }

    #[test]
    fn parses_full_document() {
        let doc = document(json!({
            "slug": { "stringValue": "motion-notes" },
            "title": { "stringValue": "Motion Notes" },
            "excerpt": { "stringValue": "Short" },
            "author": { "stringValue": "Ada" },
            "content": { "stringValue": "<p>hi</p>" },
            "date": { "timestampValue": "2024-01-02T08:15:30.250Z" },
            "imageUrl": { "stringValue": "https://cdn.example/x.png" },
            "imageHint": { "stringValue": "abstract shapes" },
        }));

        let post = doc.to_post().expect("post");
        assert_eq!(post.id.as_deref(), Some("abc123"));
        assert_eq!(post.slug, "motion-notes");
        assert_eq!(post.author, "Ada");
        assert_eq!(post.image_hint, "abstract shapes");
        assert_eq!(post.date, datetime!(2024-01-02 08:15:30.25 UTC));
    }

    #[test]
    fn normalizes_string_dates_and_defaults_display_fields() {
        let doc = document(json!({
            "slug": { "stringValue": "b" },
            "title": { "stringValue": "B" },
            "date": { "stringValue": "2024-01-01" },
        }));

        let post = doc.to_post().expect("post");
        assert_eq!(post.date, datetime!(2024-01-01 00:00 UTC));
        assert_eq!(post.excerpt, "");
        assert_eq!(post.image_url, "");
    }

    #[test]
    fn missing_slug_is_reported() {
        let doc = document(json!({
            "title": { "stringValue": "No slug" },
            "date": { "timestampValue": "2024-01-01T00:00:00Z" },
        }));

        assert!(matches!(
            doc.to_post(),
            Err(DocumentError::MissingField { field: "slug", .. })
        ));
    }

    #[test]
    fn unreadable_date_is_reported() {
        let doc = document(json!({
            "slug": { "stringValue": "a" },
            "title": { "stringValue": "A" },
            "date": { "integerValue": "1704067200" },
        }));

        assert!(matches!(
            doc.to_post(),
            Err(DocumentError::InvalidDate { .. })
        ));
    }

    #[test]
    fn encoded_fields_round_trip_through_parser() {
        let doc = document(json!({
            "slug": { "stringValue": "a" },
            "title": { "stringValue": "A" },
            "author": { "stringValue": "Studio" },
            "date": { "timestampValue": "2024-05-06T07:08:09Z" },
        }));
        let post = doc.to_post().expect("post");

        let encoded = encode_fields(&post).expect("encode");
        let reparsed = document(encoded["fields"].clone()).to_post().expect("post");
        assert_eq!(reparsed, post);
    }

    #[test]
    fn run_query_items_without_documents_are_tolerated() {
        let items: Vec<RunQueryItem> =
            serde_json::from_value(json!([{ "readTime": "2024-01-01T00:00:00Z" }]))
                .expect("items");
        assert!(items[0].document.is_none());
    }

    #[test]
    fn slug_query_filters_on_slug() {
        let query = slug_query("posts", "hello");
        assert_eq!(
            query["structuredQuery"]["where"]["fieldFilter"]["value"]["stringValue"],
            "hello"
        );
        assert_eq!(query["structuredQuery"]["limit"], 1);
    }
}
