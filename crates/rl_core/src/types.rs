use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// A single reading-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub read_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of the in-process chat log. Ids are assigned by the log in
/// insertion order and restart from zero with the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub user: String,
    pub text: String,
}

/// Validated input for `create_article`. `read_at` left absent means
/// "the moment of insertion".
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub url: Option<String>,
    pub source: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Wire payload for creating an article. Timestamps arrive as raw strings
/// and are resolved during validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: String,
    pub url: Option<String>,
    pub source: Option<String>,
    pub read_at: Option<String>,
    pub notes: Option<String>,
}

impl CreateArticleRequest {
    /// Validates the payload before anything touches the store. Empty
    /// optional strings are treated as absent.
    pub fn into_draft(self) -> Result<NewArticle> {
        if self.title.is_empty() {
            return Err(Error::Validation("title is required".into()));
        }

        let url = non_empty(self.url);
        if let Some(url) = &url {
            validate_url(url)?;
        }

        let read_at = match non_empty(self.read_at) {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };

        Ok(NewArticle {
            title: self.title,
            url,
            source: non_empty(self.source),
            read_at,
            notes: non_empty(self.notes),
        })
    }
}

/// Per-field instruction in a partial update: leave the stored value alone,
/// clear it to absent, or replace it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

/// A partial update with every field carrying an explicit instruction.
/// `title` and `read_at` can never be cleared, only replaced.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub url: FieldUpdate<String>,
    pub source: FieldUpdate<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub notes: FieldUpdate<String>,
}

impl ArticleUpdate {
    /// Applies the instructions to a stored record and refreshes
    /// `updated_at`.
    pub fn apply(self, article: &mut Article, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            article.title = title;
        }
        apply_field(&mut article.url, self.url);
        apply_field(&mut article.source, self.source);
        if let Some(read_at) = self.read_at {
            article.read_at = read_at;
        }
        apply_field(&mut article.notes, self.notes);
        article.updated_at = now;
    }
}

fn apply_field<T>(slot: &mut Option<T>, update: FieldUpdate<T>) {
    match update {
        FieldUpdate::Keep => {}
        FieldUpdate::Clear => *slot = None,
        FieldUpdate::Set(value) => *slot = Some(value),
    }
}

/// Wire payload for updating an article. An omitted field leaves the stored
/// value untouched; an empty string clears the clearable fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub read_at: Option<String>,
    pub notes: Option<String>,
}

impl UpdateArticleRequest {
    /// Maps the wire payload onto explicit per-field instructions so that
    /// "absent" and "clear" can never be conflated downstream.
    pub fn into_update(self) -> Result<ArticleUpdate> {
        let title = match self.title {
            None => None,
            Some(title) if title.is_empty() => {
                return Err(Error::Validation("title is required".into()));
            }
            Some(title) => Some(title),
        };

        let url = match self.url.as_deref() {
            None => FieldUpdate::Keep,
            Some("") => FieldUpdate::Clear,
            Some(raw) => {
                validate_url(raw)?;
                FieldUpdate::Set(raw.to_string())
            }
        };

        let read_at = match self.read_at.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_timestamp(raw)?),
        };

        Ok(ArticleUpdate {
            title,
            url,
            source: clear_or_set(self.source),
            read_at,
            notes: clear_or_set(self.notes),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
}

impl CreateTodoRequest {
    pub fn into_title(self) -> Result<String> {
        if self.title.is_empty() {
            return Err(Error::Validation("title is required".into()));
        }
        Ok(self.title)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn clear_or_set(value: Option<String>) -> FieldUpdate<String> {
    match value {
        None => FieldUpdate::Keep,
        Some(v) if v.is_empty() => FieldUpdate::Clear,
        Some(v) => FieldUpdate::Set(v),
    }
}

/// Accepts absolute http/https URLs only.
pub fn validate_url(raw: &str) -> Result<()> {
    let parsed =
        Url::parse(raw).map_err(|_| Error::Validation(format!("invalid url: {raw}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Validation(format!(
            "unsupported url scheme: {scheme}"
        ))),
    }
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(Error::Validation(format!("unparsable timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Article {
            id: 1,
            title: "Original".to_string(),
            url: Some("https://example.com".to_string()),
            source: Some("example".to_string()),
            read_at: ts,
            notes: Some("some notes".to_string()),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("https://example.com/post/1").is_ok());
        assert!(validate_url("http://example.com").is_ok());
    }

    #[test]
    fn validate_url_rejects_other_schemes_and_garbage() {
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_and_bare_dates() {
        let full = parse_timestamp("2024-01-01T12:30:00Z").unwrap();
        assert_eq!(full, Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap());

        let midnight = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn create_request_rejects_empty_title() {
        let request = CreateArticleRequest {
            title: String::new(),
            url: None,
            source: None,
            read_at: None,
            notes: None,
        };
        assert!(matches!(
            request.into_draft(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn create_request_treats_empty_optionals_as_absent() {
        let request = CreateArticleRequest {
            title: "Foo".to_string(),
            url: Some(String::new()),
            source: Some(String::new()),
            read_at: Some(String::new()),
            notes: Some(String::new()),
        };
        let draft = request.into_draft().unwrap();
        assert_eq!(draft.url, None);
        assert_eq!(draft.source, None);
        assert_eq!(draft.read_at, None);
        assert_eq!(draft.notes, None);
    }

    #[test]
    fn create_request_validates_url_and_read_at() {
        let request = CreateArticleRequest {
            title: "Foo".to_string(),
            url: Some("mailto:a@b.c".to_string()),
            source: None,
            read_at: None,
            notes: None,
        };
        assert!(request.into_draft().is_err());

        let request = CreateArticleRequest {
            title: "Foo".to_string(),
            url: Some("https://example.com".to_string()),
            source: None,
            read_at: Some("2024-01-01T00:00:00Z".to_string()),
            notes: None,
        };
        let draft = request.into_draft().unwrap();
        assert_eq!(
            draft.read_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn update_request_maps_omitted_empty_and_set_fields() {
        let update = UpdateArticleRequest {
            title: None,
            url: Some(String::new()),
            source: Some("new source".to_string()),
            read_at: None,
            notes: None,
        }
        .into_update()
        .unwrap();

        assert_eq!(update.title, None);
        assert_eq!(update.url, FieldUpdate::Clear);
        assert_eq!(update.source, FieldUpdate::Set("new source".to_string()));
        assert_eq!(update.read_at, None);
        assert_eq!(update.notes, FieldUpdate::Keep);
    }

    #[test]
    fn update_request_rejects_empty_title_and_bad_url() {
        let request = UpdateArticleRequest {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            request.into_update(),
            Err(Error::Validation(_))
        ));

        let request = UpdateArticleRequest {
            url: Some("gopher://hole".to_string()),
            ..Default::default()
        };
        assert!(request.into_update().is_err());
    }

    #[test]
    fn apply_touches_only_instructed_fields() {
        let mut stored = article();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        ArticleUpdate {
            title: Some("Changed".to_string()),
            ..Default::default()
        }
        .apply(&mut stored, now);

        assert_eq!(stored.title, "Changed");
        assert_eq!(stored.url.as_deref(), Some("https://example.com"));
        assert_eq!(stored.source.as_deref(), Some("example"));
        assert_eq!(stored.notes.as_deref(), Some("some notes"));
        assert_eq!(stored.updated_at, now);
    }

    #[test]
    fn apply_clears_on_explicit_clear() {
        let mut stored = article();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        ArticleUpdate {
            url: FieldUpdate::Clear,
            notes: FieldUpdate::Set("rewritten".to_string()),
            ..Default::default()
        }
        .apply(&mut stored, now);

        assert_eq!(stored.url, None);
        assert_eq!(stored.notes.as_deref(), Some("rewritten"));
        assert_eq!(stored.title, "Original");
    }
}
