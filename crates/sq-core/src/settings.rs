//! Upstream API coordinates: where to send requests and which filters to use.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com/2.2/";
pub const DEFAULT_SITE: &str = "stackoverflow";
/// Question list without bodies.
pub const DEFAULT_FEED_FILTER: &str = "!4(L6lo9D9N4OcoUIa";
/// Question plus answers, both with full bodies.
pub const DEFAULT_QUESTION_FILTER: &str = "!L_(IB3u73lMJDwuiLsf3k1";
/// The built-in filter already carries `is_accepted` on answers.
pub const DEFAULT_ANSWER_FILTER: &str = "default";

#[derive(Debug)]
pub struct ApiSettings {
    /// Always ends with `/` so endpoint paths join underneath it.
    pub base_url: Url,
    pub site: String,
    pub feed_filter: String,
    pub question_filter: String,
    pub answer_filter: String,
    /// Raises the daily quota when present. Never logged.
    pub api_key: Option<SecretString>,
}

impl ApiSettings {
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Joins `path` under the base URL and appends the query pairs, the
    /// site, and the API key when one is configured.
    pub fn endpoint<'a, I>(&self, path: &str, query: I) -> Url
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        // Relative joins only fail for malformed input, and paths are built
        // from integers and fixed segments.
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, &value);
            }
            pairs.append_pair("site", &self.site);
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key.expose_secret());
            }
        }
        url
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            site: DEFAULT_SITE.to_string(),
            feed_filter: DEFAULT_FEED_FILTER.to_string(),
            question_filter: DEFAULT_QUESTION_FILTER.to_string(),
            answer_filter: DEFAULT_ANSWER_FILTER.to_string(),
            api_key: None,
        }
    }
}
