//! Backend origin handling
//!
//! Maps a captured `/api/*` path and its query onto the configured backend
//! origin.

use anyhow::{Context, Result};
use url::Url;

use crate::proxy::query::QueryParams;

/// The backend service every API call is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOrigin {
    /// Origin as configured (e.g., "http://localhost:5000")
    url: String,
}

impl BackendOrigin {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Checks that the origin parses and can carry a path.
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.url)
            .with_context(|| format!("Invalid backend origin {:?}", self.url))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("Backend origin {:?} cannot carry a path", self.url);
        }
        Ok(url)
    }

    /// Builds `<origin>/api/<segments joined by '/'>` with `query` applied.
    ///
    /// The path replaces whatever path the origin has, the way an absolute
    /// path resolves against a base URL. Segments are used as received.
    pub fn target_url(&self, segments: &[String], query: &QueryParams) -> Result<Url> {
        let base = self.validate()?;
        let path = format!("/api/{}", segments.join("/"));

        let mut url = base
            .join(&path)
            .with_context(|| format!("Cannot resolve {:?} against backend origin", path))?;

        url.set_query(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.iter() {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn joins_segments_under_api() {
        let origin = BackendOrigin::new("http://localhost:5000");
        let url = origin
            .target_url(&segments(&["users", "42", "plans"]), &QueryParams::new())
            .unwrap();

        assert_eq!(url.as_str(), "http://localhost:5000/api/users/42/plans");
    }

    #[test]
    fn origin_path_is_replaced() {
        let origin = BackendOrigin::new("http://backend.internal:8000/ignored/base");
        let url = origin
            .target_url(&segments(&["health"]), &QueryParams::new())
            .unwrap();

        assert_eq!(url.as_str(), "http://backend.internal:8000/api/health");
    }

    #[test]
    fn applies_query() {
        let origin = BackendOrigin::new("http://localhost:5000");
        let query = QueryParams::parse("days=7&days=14&tz=Europe%2FBerlin");
        let url = origin
            .target_url(&segments(&["progress-data"]), &query)
            .unwrap();

        assert_eq!(url.path(), "/api/progress-data");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("days".to_string(), "14".to_string()),
                ("tz".to_string(), "Europe/Berlin".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_origin_is_an_error() {
        let origin = BackendOrigin::new("not a url");
        assert!(
            origin
                .target_url(&segments(&["login"]), &QueryParams::new())
                .is_err()
        );
    }
}
