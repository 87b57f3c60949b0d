use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{parse_timestamp, Article};
use crate::Result;

/// Inclusive bounds on `read_at`. Either side may be absent.
#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Parses optional raw bounds; empty strings count as absent.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| ts >= start) && self.end.map_or(true, |end| ts <= end)
    }
}

fn parse_bound(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => parse_timestamp(raw).map(Some),
    }
}

/// UTC calendar date of a timestamp, used as the bucket key.
pub fn day_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Articles bucketed by calendar day, in first-encountered bucket order.
/// Serializes as a JSON object whose keys iterate in that order.
#[derive(Debug, Clone)]
pub struct GroupedArticles(pub Vec<(String, Vec<Article>)>);

impl GroupedArticles {
    pub fn get(&self, key: &str) -> Option<&[Article]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, bucket)| bucket.as_slice())
    }
}

impl Serialize for GroupedArticles {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, bucket) in &self.0 {
            map.serialize_entry(key, bucket)?;
        }
        map.end()
    }
}

/// Groups a descending-sorted article list by day. Bucket order follows the
/// first occurrence of each day, so a pre-sorted input yields newest-first
/// buckets; the input order is preserved inside each bucket.
pub fn group_by_day(articles: Vec<Article>) -> GroupedArticles {
    let mut groups: Vec<(String, Vec<Article>)> = Vec::new();
    for article in articles {
        let key = day_key(article.read_at);
        match groups.iter().position(|(k, _)| *k == key) {
            Some(i) => groups[i].1.push(article),
            None => groups.push((key, vec![article])),
        }
    }
    GroupedArticles(groups)
}
