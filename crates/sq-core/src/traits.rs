//! # Core Traits (Ports)
//!
//! Anything that talks to the outside world goes through these traits so the
//! services can be exercised against mocks and fixtures.

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;

/// A single HTTP GET against the upstream API.
///
/// Implementations must send `Accept: application/json`, decode gzip/deflate
/// bodies, and never retry. They hold no per-request state, so one instance
/// may be shared by any number of concurrent callers.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the full decoded body, or fails on network error, non-2xx
    /// status, or undecodable compression.
    async fn get(&self, url: &Url) -> Result<String, TransportError>;
}

/// A source of uniformly distributed integers in a bounded range.
pub trait RandomSource {
    /// Returns a uniformly random value in `0..=upper`.
    fn uniform_inclusive(&mut self, upper: usize) -> usize;
}

impl<R: rand::Rng + ?Sized> RandomSource for R {
    fn uniform_inclusive(&mut self, upper: usize) -> usize {
        self.gen_range(0..=upper)
    }
}
