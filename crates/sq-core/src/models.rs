//! # Domain Models
//!
//! These structs represent the upstream Q&A entities the quiz works with.
//! Questions and answers are immutable once built; only the order of answers
//! inside a [`QuestionAndAnswers`] may change.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream identifier of a question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionId(pub u64);

/// Upstream identifier of an answer, unique within its question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnswerId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single upstream question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    /// Already HTML encoded by upstream, safe to render as-is.
    title: String,
    creation_time: Option<DateTime<Local>>,
    /// Absent for feed queries, whose filter strips bodies.
    body_html: Option<String>,
}

impl Question {
    /// Builds a question from explicit values, with no body or timestamp.
    pub fn new(id: QuestionId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            creation_time: None,
            body_html: None,
        }
    }

    pub(crate) fn from_parts(
        id: QuestionId,
        title: String,
        creation_time: Option<DateTime<Local>>,
        body_html: Option<String>,
    ) -> Self {
        Self {
            id,
            title,
            creation_time,
            body_html,
        }
    }

    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn creation_time(&self) -> Option<DateTime<Local>> {
        self.creation_time
    }

    /// Creation time, falling back to the Unix epoch for call sites that
    /// always need a timestamp to display.
    pub fn creation_time_or_epoch(&self) -> DateTime<Local> {
        self.creation_time
            .unwrap_or_else(|| Local.timestamp_opt(0, 0).single().unwrap_or_default())
    }

    pub fn body_html(&self) -> Option<&str> {
        self.body_html.as_deref()
    }
}

/// One answer to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    id: AnswerId,
    body_html: Option<String>,
}

impl Answer {
    pub fn new(id: AnswerId, body_html: Option<String>) -> Self {
        Self { id, body_html }
    }

    pub fn id(&self) -> AnswerId {
        self.id
    }

    pub fn body_html(&self) -> Option<&str> {
        self.body_html.as_deref()
    }
}

/// A question together with its full answer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionAndAnswers {
    pub question: Question,
    /// Upstream order until shuffled.
    pub answers: Vec<Answer>,
}

impl QuestionAndAnswers {
    pub fn new(question: Question, answers: Vec<Answer>) -> Self {
        Self { question, answers }
    }

    pub fn answer_ids(&self) -> Vec<AnswerId> {
        self.answers.iter().map(Answer::id).collect()
    }
}

/// What the presentation layer shows on the question list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestionFeed {
    /// Creation date descending, as returned by upstream.
    pub questions: Vec<Question>,
    /// Only set by guess verification or after an upstream failure.
    pub alert_message: Option<String>,
}

impl QuestionFeed {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            alert_message: None,
        }
    }

    pub fn with_alert(mut self, message: impl Into<String>) -> Self {
        self.alert_message = Some(message.into());
        self
    }
}

/// Result of looking a single answer up upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcceptedStatus {
    pub answer_id: AnswerId,
    pub question_id: Option<QuestionId>,
    pub is_accepted: bool,
}

/// Quota bookkeeping the upstream attaches to every response envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseMeta {
    pub quota_remaining: Option<u32>,
    pub quota_max: Option<u32>,
    pub has_more: Option<bool>,
    /// Seconds the upstream asks clients to wait before the next request.
    pub backoff: Option<u32>,
}
