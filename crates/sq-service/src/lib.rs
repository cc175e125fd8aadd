//! # sq-service
//!
//! Orchestrates the flow between the quiz operations and the upstream API:
//! build the request, run it through the `Transport`, parse the envelope.
//!
//! Every call re-fetches; nothing is cached between requests and nothing is
//! retried, since upstream failures are usually throttling and retries would
//! only dig the hole deeper.

pub mod feed;
pub mod home;
pub mod session;

use sq_core::error::UpstreamError;
use sq_core::parser::Envelope;
use sq_core::settings::ApiSettings;
use sq_core::traits::Transport;
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub use feed::FeedQuery;
pub use home::{FeedDefaults, QuizHome};

/// Entry point for every upstream lookup. Cheap to clone; clones share the
/// same transport and settings.
#[derive(Clone)]
pub struct DataService {
    transport: Arc<dyn Transport>,
    settings: Arc<ApiSettings>,
}

impl DataService {
    pub fn new(transport: Arc<dyn Transport>, settings: Arc<ApiSettings>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    async fn fetch_envelope(&self, url: &Url) -> Result<Envelope, UpstreamError> {
        debug!(path = url.path(), "requesting upstream");
        let raw = self.transport.get(url).await?;
        let envelope = Envelope::parse(&raw)?;
        debug!(
            items = envelope.items.len(),
            quota_remaining = envelope.meta.quota_remaining,
            backoff = envelope.meta.backoff,
            "upstream envelope parsed"
        );
        Ok(envelope)
    }
}
