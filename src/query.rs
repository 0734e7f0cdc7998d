//! # Query Sanitization Module
//!
//! ## Purpose
//! Pure, side-effect-free query sanitization and boundary validation shared
//! by the edge proxy and the backend service. The same checks run at both
//! tiers on purpose: a boundary already crossed is never trusted.
//!
//! ## Input/Output Specification
//! - **Input**: Raw user-supplied query strings
//! - **Output**: Sanitized queries (NUL-stripped, trimmed) and validation
//!   verdicts
//! - **Bounds**: Edge tier forwards lengths in [1, 50]; the service only
//!   executes lengths in [2, 50]

use crate::errors::{Result, SearchError};

/// Maximum query length accepted anywhere in the pipeline
pub const MAX_QUERY_LEN: usize = 50;

/// Minimum query length the edge tier forwards
pub const EDGE_MIN_QUERY_LEN: usize = 1;

/// Strip embedded NUL characters and trim surrounding whitespace.
///
/// Runs before any other use of the query, at every tier.
pub fn sanitize(raw: &str) -> String {
    raw.replace('\0', "").trim().to_string()
}

/// Query length in characters, not bytes. The bounds are user-facing
/// ("max 50 characters"), and a Cyrillic character is two bytes in UTF-8.
pub fn query_length(query: &str) -> usize {
    query.chars().count()
}

/// Validate a sanitized query for forwarding at the edge tier.
///
/// Empty queries are not an error here; the edge answers them with an empty
/// result list, distinguishing "nothing asked" from "nothing found".
pub fn validate_forwardable(query: &str) -> Result<()> {
    if query_length(query) > MAX_QUERY_LEN {
        return Err(SearchError::Validation {
            field: "q".to_string(),
            reason: format!("query exceeds {} characters", MAX_QUERY_LEN),
        });
    }
    Ok(())
}

/// Whether the service tier should execute the lookup at all.
///
/// Lengths outside [min, max] yield an empty result rather than an error; a
/// single character is deliberately below the service bound even though the
/// edge forwards it (avoids overly broad prefix scans).
pub fn within_service_bounds(query: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&query_length(query))
}
