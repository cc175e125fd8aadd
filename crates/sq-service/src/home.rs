//! # QuizHome
//!
//! The flows a presentation layer drives: list questions, open one, guess.
//! Unlike the raw `DataService` calls these never fail; upstream trouble is
//! turned into an alert message on the returned feed.

use sq_core::error::{AppError, Result, UpstreamError};
use sq_core::models::{AnswerId, QuestionAndAnswers, QuestionFeed, QuestionId};
use tracing::{info, instrument, warn};

use crate::DataService;

pub const CORRECT_ALERT: &str = "Correct!";
pub const WRONG_ALERT: &str = "Wrong!";
pub const UNAVAILABLE_ALERT: &str =
    "Could not reach the Stack Exchange API. It may be throttling requests; please try again in a little while.";
pub const UNKNOWN_ANSWER_ALERT: &str = "That answer could not be found.";

/// Parameters of the question list shown on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedDefaults {
    pub num_questions: i64,
    pub min_answers: i64,
    pub is_accepted: bool,
}

impl Default for FeedDefaults {
    fn default() -> Self {
        Self {
            num_questions: 15,
            min_answers: 2,
            is_accepted: true,
        }
    }
}

#[derive(Clone)]
pub struct QuizHome {
    service: DataService,
    defaults: FeedDefaults,
}

impl QuizHome {
    pub fn new(service: DataService, defaults: FeedDefaults) -> Self {
        Self { service, defaults }
    }

    pub fn service(&self) -> &DataService {
        &self.service
    }

    /// The question list. On upstream failure the list is empty and the
    /// alert explains why.
    #[instrument(skip(self))]
    pub async fn index(&self) -> QuestionFeed {
        match self.load_feed().await {
            Ok(feed) => feed,
            Err(err) => {
                warn!(error = %err, throttled = err.is_throttled(), "feed unavailable");
                QuestionFeed::default().with_alert(UNAVAILABLE_ALERT)
            }
        }
    }

    /// One question with its answers in a fresh random order.
    pub async fn question(&self, id: QuestionId) -> Result<QuestionAndAnswers> {
        self.service.view_question(id).await
    }

    /// Checks a guess and returns the question list carrying the verdict.
    /// The verdict wins over a feed failure: the list may come back empty
    /// but the guess is still answered.
    #[instrument(skip(self))]
    pub async fn answer_guess(&self, answer_id: AnswerId) -> QuestionFeed {
        let feed = match self.load_feed().await {
            Ok(feed) => feed,
            Err(err) => {
                warn!(error = %err, "feed unavailable while checking a guess");
                QuestionFeed::default()
            }
        };

        let alert = match self.service.is_accepted_answer(answer_id).await {
            Ok(true) => CORRECT_ALERT,
            Ok(false) => WRONG_ALERT,
            Err(AppError::NotFound { .. }) => UNKNOWN_ANSWER_ALERT,
            Err(AppError::Upstream(err)) => {
                warn!(error = %err, "guess could not be verified");
                UNAVAILABLE_ALERT
            }
        };
        info!(%answer_id, alert, "guess checked");
        feed.with_alert(alert)
    }

    async fn load_feed(&self) -> std::result::Result<QuestionFeed, UpstreamError> {
        let FeedDefaults {
            num_questions,
            min_answers,
            is_accepted,
        } = self.defaults;
        let questions = self
            .service
            .fetch_answered_questions(num_questions, min_answers, is_accepted)
            .await?;
        Ok(QuestionFeed::new(questions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{service_replying, service_routing};
    use sq_core::error::TransportError;

    const FEED: &str = r#"{"items": [
        {"question_id": 2, "title": "b", "creation_date": 200},
        {"question_id": 1, "title": "a", "creation_date": 100}
    ]}"#;

    fn home(routes: Vec<(&'static str, String)>) -> QuizHome {
        QuizHome::new(service_routing(routes), FeedDefaults::default())
    }

    #[tokio::test]
    async fn index_has_no_alert() {
        let home = home(vec![("/search/advanced", FEED.to_string())]);
        let feed = home.index().await;
        assert_eq!(feed.questions.len(), 2);
        assert_eq!(feed.alert_message, None);
    }

    #[tokio::test]
    async fn index_uses_home_defaults() {
        let (service, seen) = service_replying(Ok(FEED.to_string()));
        QuizHome::new(service, FeedDefaults::default()).index().await;

        let url = seen.lock().unwrap()[0].clone();
        let query = url.query().unwrap_or_default().to_string();
        assert!(query.contains("pagesize=15"), "{query}");
        assert!(query.contains("answers=2"), "{query}");
        assert!(query.contains("accepted=true"), "{query}");
    }

    #[tokio::test]
    async fn index_turns_throttling_into_alert() {
        let (service, _) = service_replying(Err(TransportError::from_status(400, "throttle_violation")));
        let feed = QuizHome::new(service, FeedDefaults::default()).index().await;
        assert!(feed.questions.is_empty());
        assert_eq!(feed.alert_message.as_deref(), Some(UNAVAILABLE_ALERT));
    }

    #[tokio::test]
    async fn guess_reports_correct_and_wrong() {
        let home = home(vec![
            ("/search/advanced", FEED.to_string()),
            ("/answers/10/", r#"{"items": [{"answer_id": 10, "is_accepted": true}]}"#.to_string()),
            ("/answers/11/", r#"{"items": [{"answer_id": 11, "is_accepted": false}]}"#.to_string()),
        ]);

        let feed = home.answer_guess(AnswerId(10)).await;
        assert_eq!(feed.alert_message.as_deref(), Some(CORRECT_ALERT));
        assert_eq!(feed.questions.len(), 2);

        let feed = home.answer_guess(AnswerId(11)).await;
        assert_eq!(feed.alert_message.as_deref(), Some(WRONG_ALERT));
    }

    #[tokio::test]
    async fn guess_on_unknown_answer() {
        let home = home(vec![
            ("/search/advanced", FEED.to_string()),
            ("/answers/12/", r#"{"items": []}"#.to_string()),
        ]);
        let feed = home.answer_guess(AnswerId(12)).await;
        assert_eq!(feed.alert_message.as_deref(), Some(UNKNOWN_ANSWER_ALERT));
    }

    #[tokio::test]
    async fn guess_when_upstream_is_down() {
        // No route for the answer: the routing mock answers 404.
        let home = home(vec![("/search/advanced", FEED.to_string())]);
        let feed = home.answer_guess(AnswerId(13)).await;
        assert_eq!(feed.alert_message.as_deref(), Some(UNAVAILABLE_ALERT));
        assert_eq!(feed.questions.len(), 2);
    }

    #[tokio::test]
    async fn question_is_shuffled_view() {
        let body = r#"{"items": [{"question_id": 3, "title": "q", "body": "<p>q</p>",
            "answers": [{"answer_id": 30, "body": "<p>x</p>"}, {"answer_id": 31, "body": "<p>y</p>"}]}]}"#;
        let home = home(vec![("/questions/3/", body.to_string())]);
        let qa = home.question(QuestionId(3)).await.unwrap();
        let mut ids = qa.answer_ids();
        ids.sort();
        assert_eq!(ids, vec![AnswerId(30), AnswerId(31)]);
    }
}
