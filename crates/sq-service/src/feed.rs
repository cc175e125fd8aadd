//! Feed retrieval: the most recently created answered questions.

use sq_core::error::UpstreamError;
use sq_core::models::Question;
use sq_core::parser;
use tracing::instrument;
use url::Url;

use crate::DataService;

/// Upper bound the upstream accepts for `pagesize`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalized parameters of a feed request. Out-of-range input is pulled
/// into range rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    /// 1..=100
    pub num_questions: u32,
    /// At least 1
    pub min_answers: u64,
    /// Only questions with (true) or without (false) an accepted answer
    pub is_accepted: bool,
}

impl FeedQuery {
    pub fn new(num_questions: i64, min_answers: i64, is_accepted: bool) -> Self {
        Self {
            num_questions: num_questions.clamp(1, MAX_PAGE_SIZE) as u32,
            min_answers: min_answers.max(1) as u64,
            is_accepted,
        }
    }

    /// Single page, newest first.
    fn query_pairs(&self, filter: &str) -> Vec<(&'static str, String)> {
        vec![
            ("page", "1".to_string()),
            ("pagesize", self.num_questions.to_string()),
            ("order", "desc".to_string()),
            ("sort", "creation".to_string()),
            ("accepted", self.is_accepted.to_string()),
            ("answers", self.min_answers.to_string()),
            ("filter", filter.to_string()),
        ]
    }
}

impl DataService {
    /// Builds the `/search/advanced` URL for `query`.
    pub fn feed_url(&self, query: &FeedQuery) -> Url {
        let settings = self.settings();
        settings.endpoint("search/advanced", query.query_pairs(&settings.feed_filter))
    }

    /// Fetches up to `num_questions` answered questions, newest first.
    ///
    /// The feed filter strips bodies, so every returned question has
    /// `body_html() == None`. Fails as a whole; a partial list is never
    /// returned.
    #[instrument(skip(self))]
    pub async fn fetch_answered_questions(
        &self,
        num_questions: i64,
        min_answers: i64,
        is_accepted: bool,
    ) -> Result<Vec<Question>, UpstreamError> {
        let query = FeedQuery::new(num_questions, min_answers, is_accepted);
        let envelope = self.fetch_envelope(&self.feed_url(&query)).await?;
        Ok(envelope.map_items(parser::question_from_item)?)
    }
}
