//! Quiz session: one question with all of its answers, and the guess check.

use serde_json::Value;
use sq_core::error::{AppError, Result};
use sq_core::models::{AcceptedStatus, AnswerId, QuestionAndAnswers, QuestionId};
use sq_core::parser::{self, Envelope};
use sq_core::shuffle::{shuffle_answers, shuffle_answers_with};
use sq_core::traits::RandomSource;
use tracing::{debug, instrument};
use url::Url;

use crate::DataService;

impl DataService {
    pub fn question_url(&self, id: QuestionId) -> Url {
        let settings = self.settings();
        settings.endpoint(
            &format!("questions/{id}/"),
            [
                ("order", "desc".to_string()),
                ("sort", "creation".to_string()),
                ("filter", settings.question_filter.clone()),
            ],
        )
    }

    pub fn answer_url(&self, id: AnswerId) -> Url {
        let settings = self.settings();
        settings.endpoint(
            &format!("answers/{id}/"),
            [("filter", settings.answer_filter.clone())],
        )
    }

    /// Fetches question `id` with full bodies for it and every answer.
    /// Answers come back in upstream order.
    #[instrument(skip(self))]
    pub async fn fetch_question_and_answers(&self, id: QuestionId) -> Result<QuestionAndAnswers> {
        if id.0 == 0 {
            return Err(not_found("question", id.0));
        }
        let envelope = self.fetch_envelope(&self.question_url(id)).await?;
        let item = single_item(&envelope, "question", id.0)?;
        let qa = parser::question_and_answers_from_item(item)?;
        if qa.question.id() != id {
            return Err(not_found("question", id.0));
        }
        debug!(answers = qa.answers.len(), "question loaded");
        Ok(qa)
    }

    /// Fetches question `id` and shuffles its answers for display.
    pub async fn view_question(&self, id: QuestionId) -> Result<QuestionAndAnswers> {
        let mut qa = self.fetch_question_and_answers(id).await?;
        shuffle_answers(&mut qa.answers);
        Ok(qa)
    }

    /// [`view_question`](Self::view_question) with a caller-supplied random
    /// source.
    pub async fn view_question_with<R: RandomSource + Send + ?Sized>(
        &self,
        id: QuestionId,
        rng: &mut R,
    ) -> Result<QuestionAndAnswers> {
        let mut qa = self.fetch_question_and_answers(id).await?;
        shuffle_answers_with(&mut qa.answers, rng);
        Ok(qa)
    }

    /// Looks `answer_id` up upstream. Always a fresh request: a client's
    /// copy of the answer list proves nothing about acceptance.
    #[instrument(skip(self))]
    pub async fn accepted_status(&self, answer_id: AnswerId) -> Result<AcceptedStatus> {
        if answer_id.0 == 0 {
            return Err(not_found("answer", answer_id.0));
        }
        let envelope = self.fetch_envelope(&self.answer_url(answer_id)).await?;
        let item = single_item(&envelope, "answer", answer_id.0)?;
        let status = parser::accepted_status_from_item(item)?;
        if status.answer_id != answer_id {
            return Err(not_found("answer", answer_id.0));
        }
        Ok(status)
    }

    pub async fn is_accepted_answer(&self, answer_id: AnswerId) -> Result<bool> {
        Ok(self.accepted_status(answer_id).await?.is_accepted)
    }
}

fn single_item<'a>(envelope: &'a Envelope, kind: &'static str, id: u64) -> Result<&'a Value> {
    match envelope.items.as_slice() {
        [item] => Ok(item),
        _ => Err(not_found(kind, id)),
    }
}

fn not_found(kind: &'static str, id: u64) -> AppError {
    AppError::NotFound { kind, id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{service_replying, service_routing};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sq_core::error::{ParseError, TransportError, UpstreamError};

    const QUESTION: &str = r#"{
        "items": [{
            "question_id": 64215481,
            "title": "Why does my loop never end?",
            "creation_date": 1601916543,
            "body": "<p>It spins forever.</p>",
            "answers": [
                {"answer_id": 64215600, "body": "<p>Your counter never changes.</p>"},
                {"answer_id": 64215611, "body": "<p>Use a for loop.</p>"},
                {"answer_id": 64215702, "body": "<p>Add a break.</p>"}
            ]
        }],
        "quota_remaining": 250
    }"#;

    fn answer_envelope(answer_id: u64, accepted: bool) -> String {
        format!(
            r#"{{"items": [{{"answer_id": {answer_id}, "question_id": 64215481, "is_accepted": {accepted}, "score": 3}}]}}"#
        )
    }

    #[test]
    fn question_and_answer_urls() {
        let (service, _) = service_replying(Ok(QUESTION.to_string()));
        insta::assert_snapshot!(
            service.question_url(QuestionId(64215481)).as_str(),
            @"https://api.stackexchange.com/2.2/questions/64215481/?order=desc&sort=creation&filter=%21L_%28IB3u73lMJDwuiLsf3k1&site=stackoverflow"
        );
        insta::assert_snapshot!(
            service.answer_url(AnswerId(64215600)).as_str(),
            @"https://api.stackexchange.com/2.2/answers/64215600/?filter=default&site=stackoverflow"
        );
    }

    #[tokio::test]
    async fn question_with_answers_in_upstream_order() {
        let (service, seen) = service_replying(Ok(QUESTION.to_string()));
        let qa = service.fetch_question_and_answers(QuestionId(64215481)).await.unwrap();

        assert_eq!(qa.question.id(), QuestionId(64215481));
        assert_eq!(qa.question.body_html(), Some("<p>It spins forever.</p>"));
        assert_eq!(
            qa.answer_ids(),
            vec![AnswerId(64215600), AnswerId(64215611), AnswerId(64215702)]
        );
        assert!(qa.answers.iter().all(|a| a.body_html().is_some_and(|b| !b.is_empty())));
        assert_eq!(seen.lock().unwrap()[0].path(), "/2.2/questions/64215481/");
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let (service, _) = service_replying(Ok(r#"{"items": []}"#.to_string()));
        let err = service.fetch_question_and_answers(QuestionId(1)).await.unwrap_err();
        assert_eq!(err, AppError::NotFound { kind: "question", id: 1 });
    }

    #[tokio::test]
    async fn mismatched_question_is_not_found() {
        let (service, _) = service_replying(Ok(QUESTION.to_string()));
        let err = service.fetch_question_and_answers(QuestionId(5)).await.unwrap_err();
        assert_eq!(err, AppError::NotFound { kind: "question", id: 5 });
    }

    #[tokio::test]
    async fn duplicate_question_items_are_not_found() {
        let item = r#"{"question_id": 5, "title": "Twice", "answers": []}"#;
        let (service, _) = service_replying(Ok(format!(r#"{{"items": [{item}, {item}]}}"#)));
        let err = service.fetch_question_and_answers(QuestionId(5)).await.unwrap_err();
        assert_eq!(err, AppError::NotFound { kind: "question", id: 5 });
    }

    #[tokio::test]
    async fn zero_id_never_reaches_upstream() {
        let (service, seen) = service_replying(Ok(QUESTION.to_string()));
        let err = service.fetch_question_and_answers(QuestionId(0)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failures_keep_their_kind() {
        let (service, _) = service_replying(Err(TransportError::Network("reset".into())));
        let err = service.fetch_question_and_answers(QuestionId(7)).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(UpstreamError::Transport(_))));

        let (service, _) = service_replying(Ok(r#"{"oops": true}"#.to_string()));
        let err = service.is_accepted_answer(AnswerId(7)).await.unwrap_err();
        assert_eq!(err, AppError::from(ParseError::MissingItems));
    }

    #[tokio::test]
    async fn view_question_shuffles_a_permutation() {
        let (service, _) = service_replying(Ok(QUESTION.to_string()));
        let canonical = service.fetch_question_and_answers(QuestionId(64215481)).await.unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let mut orders = std::collections::HashSet::new();
        for _ in 0..30 {
            let viewed = service
                .view_question_with(QuestionId(64215481), &mut rng)
                .await
                .unwrap();
            let mut ids = viewed.answer_ids();
            orders.insert(ids.clone());
            ids.sort();
            let mut expected = canonical.answer_ids();
            expected.sort();
            assert_eq!(ids, expected);
            assert_eq!(viewed.question, canonical.question);
        }
        assert!(orders.len() > 1, "30 viewings produced a single order");

        let viewed = service.view_question(QuestionId(64215481)).await.unwrap();
        assert_eq!(viewed.answers.len(), 3);
    }

    #[tokio::test]
    async fn only_the_upstream_accepted_answer_is_correct() {
        let service = service_routing(vec![
            ("/answers/64215600/", answer_envelope(64215600, false)),
            ("/answers/64215611/", answer_envelope(64215611, true)),
            ("/answers/64215702/", answer_envelope(64215702, false)),
        ]);

        assert!(service.is_accepted_answer(AnswerId(64215611)).await.unwrap());
        assert!(!service.is_accepted_answer(AnswerId(64215600)).await.unwrap());
        assert!(!service.is_accepted_answer(AnswerId(64215702)).await.unwrap());

        let status = service.accepted_status(AnswerId(64215611)).await.unwrap();
        assert_eq!(status.question_id, Some(QuestionId(64215481)));
    }

    #[tokio::test]
    async fn unknown_answer_is_not_found() {
        let (service, _) = service_replying(Ok(r#"{"items": []}"#.to_string()));
        let err = service.is_accepted_answer(AnswerId(99)).await.unwrap_err();
        assert_eq!(err, AppError::NotFound { kind: "answer", id: 99 });
    }

    #[tokio::test]
    async fn duplicate_answer_items_are_not_found() {
        let item = r#"{"answer_id": 64215611, "question_id": 64215481, "is_accepted": true}"#;
        let (service, _) = service_replying(Ok(format!(r#"{{"items": [{item}, {item}]}}"#)));
        let err = service.accepted_status(AnswerId(64215611)).await.unwrap_err();
        assert_eq!(err, AppError::NotFound { kind: "answer", id: 64215611 });
        assert!(service.is_accepted_answer(AnswerId(64215611)).await.is_err());
    }
}
