use crate::entities::sentiment::Headline;
use chrono::{DateTime, Utc};

/// Scored headlines matching `keyword`, published at or after `since`.
pub trait HeadlineRepository {
    fn headlines(&self, keyword: &str, since: DateTime<Utc>) -> Result<Vec<Headline>, String>;
}
