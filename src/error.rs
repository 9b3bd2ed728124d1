use thiserror::Error;

/// Failure of a single source fetch. Carries the registry id and url of
/// the source so the aggregator can report which feed misbehaved; never
/// propagates past the aggregation boundary.
#[derive(Debug, Error)]
#[error("source {source_id} ({url}): {kind}")]
pub struct FetchError {
    pub source_id: usize,
    pub url: String,
    #[source]
    pub kind: FetchErrorKind,
}

#[derive(Debug, Error)]
pub enum FetchErrorKind {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse failed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Every configured source failed during a refresh. Reaches the caller
/// only when the cache holds no previous result to fall back on.
#[derive(Debug, Error)]
#[error("all {attempted} feed sources failed")]
pub struct AllSourcesFailed {
    pub attempted: usize,
}
