//! # Response Parser
//!
//! Maps upstream JSON documents onto the domain models.
//!
//! Every upstream response is an envelope object carrying an `items` array
//! plus quota bookkeeping. Items are walked as loose [`serde_json::Value`]s
//! because ids may arrive either as JSON numbers or as numeric strings, and
//! because an absent optional field must stay distinguishable from an empty
//! one.

use chrono::{DateTime, Local, TimeZone};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::models::{
    AcceptedStatus, Answer, AnswerId, Question, QuestionAndAnswers, QuestionId, ResponseMeta,
};

/// A parsed `{ "items": [...] }` document.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub items: Vec<Value>,
    pub meta: ResponseMeta,
}

impl Envelope {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let document: Value =
            serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        // Quota fields are informational; a malformed one must not fail the call.
        let meta = ResponseMeta::deserialize(&document).unwrap_or_default();

        match document {
            Value::Object(mut fields) => match fields.remove("items") {
                Some(Value::Array(items)) => Ok(Self { items, meta }),
                _ => Err(ParseError::MissingItems),
            },
            _ => Err(ParseError::MissingItems),
        }
    }

    /// Parses every item with `f`, preserving upstream order. The first
    /// failing item fails the whole document.
    pub fn map_items<T>(
        &self,
        f: impl Fn(&Value) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        self.items.iter().map(f).collect()
    }
}

/// Body of a non-success upstream response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub error_id: Option<i64>,
    pub error_name: Option<String>,
    pub error_message: Option<String>,
}

impl ErrorEnvelope {
    /// Returns `None` unless `raw` is an upstream error document.
    pub fn parse(raw: &str) -> Option<Self> {
        let envelope: ErrorEnvelope = serde_json::from_str(raw).ok()?;
        if envelope.error_name.is_none() && envelope.error_message.is_none() {
            return None;
        }
        Some(envelope)
    }

    /// Human-readable `name: message` summary.
    pub fn describe(&self) -> String {
        match (&self.error_name, &self.error_message) {
            (Some(name), Some(message)) => format!("{name}: {message}"),
            (Some(name), None) => name.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "unknown upstream error".to_string(),
        }
    }
}

pub fn question_from_item(item: &Value) -> Result<Question, ParseError> {
    ensure_object(item)?;
    let id = QuestionId(id_field(item, "question_id")?);
    let title = string_field(item, "title")?.ok_or(ParseError::MissingField("title"))?;
    let creation_time = integer_field(item, "creation_date")?
        .map(|secs| local_time(secs, "creation_date"))
        .transpose()?;
    let body_html = string_field(item, "body")?;

    Ok(Question::from_parts(id, title, creation_time, body_html))
}

pub fn answer_from_item(item: &Value) -> Result<Answer, ParseError> {
    ensure_object(item)?;
    let id = AnswerId(id_field(item, "answer_id")?);
    let body_html = string_field(item, "body")?;

    Ok(Answer::new(id, body_html))
}

/// Parses a question item that embeds its `answers` array.
/// A question nobody answered comes back without the field at all.
pub fn question_and_answers_from_item(item: &Value) -> Result<QuestionAndAnswers, ParseError> {
    let question = question_from_item(item)?;
    let answers = match item.get("answers") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(answers)) => answers
            .iter()
            .map(answer_from_item)
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(ParseError::InvalidField {
                field: "answers",
                reason: format!("expected an array, found {}", kind(other)),
            })
        }
    };

    Ok(QuestionAndAnswers::new(question, answers))
}

pub fn accepted_status_from_item(item: &Value) -> Result<AcceptedStatus, ParseError> {
    ensure_object(item)?;
    let answer_id = AnswerId(id_field(item, "answer_id")?);
    let question_id = optional_id_field(item, "question_id")?.map(QuestionId);
    let is_accepted = match item.get("is_accepted") {
        Some(Value::Bool(flag)) => *flag,
        None | Some(Value::Null) => return Err(ParseError::MissingField("is_accepted")),
        Some(other) => {
            return Err(ParseError::InvalidField {
                field: "is_accepted",
                reason: format!("expected a boolean, found {}", kind(other)),
            })
        }
    };

    Ok(AcceptedStatus {
        answer_id,
        question_id,
        is_accepted,
    })
}

fn ensure_object(item: &Value) -> Result<(), ParseError> {
    if item.is_object() {
        Ok(())
    } else {
        Err(ParseError::InvalidField {
            field: "items",
            reason: format!("expected an object, found {}", kind(item)),
        })
    }
}

/// Accepts JSON integers and numeric strings. `null` counts as absent.
fn integer_field(item: &Value, field: &'static str) -> Result<Option<i64>, ParseError> {
    match item.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| ParseError::InvalidField {
            field,
            reason: format!("{n} is not an integer"),
        }),
        Some(Value::String(s)) => {
            s.trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|e| ParseError::InvalidField {
                    field,
                    reason: format!("{s:?}: {e}"),
                })
        }
        Some(other) => Err(ParseError::InvalidField {
            field,
            reason: format!("expected an integer, found {}", kind(other)),
        }),
    }
}

fn id_field(item: &Value, field: &'static str) -> Result<u64, ParseError> {
    optional_id_field(item, field)?.ok_or(ParseError::MissingField(field))
}

fn optional_id_field(item: &Value, field: &'static str) -> Result<Option<u64>, ParseError> {
    let Some(value) = integer_field(item, field)? else {
        return Ok(None);
    };
    u64::try_from(value)
        .ok()
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or_else(|| ParseError::InvalidField {
            field,
            reason: format!("{value} is not a positive id"),
        })
}

fn string_field(item: &Value, field: &'static str) -> Result<Option<String>, ParseError> {
    match item.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ParseError::InvalidField {
            field,
            reason: format!("expected a string, found {}", kind(other)),
        }),
    }
}

fn local_time(secs: i64, field: &'static str) -> Result<DateTime<Local>, ParseError> {
    Local
        .timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| ParseError::InvalidField {
            field,
            reason: format!("{secs} is out of range for a timestamp"),
        })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
