//! Error classification for generation-service failures
//!
//! Maps a raised failure to a kind and a retryable flag. Typed errors keep
//! their kind; untyped (`Unknown`) errors and raw HTTP bodies are keyword
//! matched against their message. Classification is pure.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorKind, GenerationError};

/// Outcome of classifying a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub retryable: bool,
}

impl Classification {
    fn of(kind: ErrorKind) -> Self {
        Self {
            kind,
            retryable: kind.is_retryable(),
        }
    }
}

// Order matters: quota messages frequently also mention rate limits or 429.
const QUOTA_KEYWORDS: &[&str] = &[
    "insufficient_quota",
    "quota",
    "billing",
    "credit balance",
    "payment required",
];
const AUTH_KEYWORDS: &[&str] = &[
    "unauthorized",
    "invalid api key",
    "invalid_api_key",
    "incorrect api key",
    "authentication",
    "permission denied",
    "forbidden",
    "401",
    "403",
];
const CONTENT_FILTER_KEYWORDS: &[&str] = &[
    "content_filter",
    "content filter",
    "content policy",
    "content_policy",
    "safety system",
    "flagged",
];
const RATE_LIMIT_KEYWORDS: &[&str] = &["rate limit", "rate_limit", "too many requests", "429"];
const NETWORK_KEYWORDS: &[&str] = &[
    "timed out",
    "timeout",
    "network",
    "connection",
    "connect",
    "econnreset",
    "econnrefused",
    "socket",
    "dns",
];
const SERVER_KEYWORDS: &[&str] = &[
    "internal server error",
    "server error",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "overloaded",
    "500",
    "502",
    "503",
    "504",
];

/// Keyword-match a failure message to a classification
pub fn classify_message(message: &str) -> Classification {
    let lower = message.to_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    let kind = if matches_any(QUOTA_KEYWORDS) {
        ErrorKind::Quota
    } else if matches_any(AUTH_KEYWORDS) {
        ErrorKind::Auth
    } else if matches_any(CONTENT_FILTER_KEYWORDS) {
        ErrorKind::ContentFilter
    } else if matches_any(RATE_LIMIT_KEYWORDS) {
        ErrorKind::RateLimit
    } else if matches_any(SERVER_KEYWORDS) {
        ErrorKind::Server
    } else if matches_any(NETWORK_KEYWORDS) {
        ErrorKind::Network
    } else {
        ErrorKind::Unknown
    };

    Classification::of(kind)
}

/// Classify a pipeline error
pub fn classify(error: &GenerationError) -> Classification {
    match error.root() {
        GenerationError::Unknown(message) => classify_message(message),
        other => Classification::of(other.kind()),
    }
}

/// Map a non-success HTTP response from the generation service to an error
pub fn map_http_error(status: StatusCode, body: &str) -> GenerationError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        if body.is_empty() {
            status.to_string()
        } else if body.len() > 200 {
            format!("{}: {:.200}...", status, body)
        } else {
            format!("{}: {}", status, body)
        }
    });

    let by_message = classify_message(&message).kind;
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Auth,
        StatusCode::PAYMENT_REQUIRED => ErrorKind::Quota,
        StatusCode::TOO_MANY_REQUESTS if by_message == ErrorKind::Quota => ErrorKind::Quota,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimit,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Network,
        s if s.is_server_error() => ErrorKind::Server,
        _ => by_message,
    };

    GenerationError::from_kind(kind, message)
}

/// Pull a human-readable message out of an OpenAI-style error body
fn extract_error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;

    if let Some(error) = json.get("error") {
        if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
            return match error.get("code").and_then(|c| c.as_str()) {
                Some(code) => Some(format!("{} ({})", message, code)),
                None => Some(message.to_string()),
            };
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }

    json.get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classification() {
        assert_eq!(classify_message("Request timed out after 20s").kind, ErrorKind::Network);
        assert_eq!(classify_message("Rate limit reached for requests").kind, ErrorKind::RateLimit);
        assert_eq!(classify_message("Incorrect API key provided").kind, ErrorKind::Auth);
        assert_eq!(
            classify_message("You exceeded your current quota (429)").kind,
            ErrorKind::Quota
        );
        assert_eq!(classify_message("The server is overloaded").kind, ErrorKind::Server);
        assert_eq!(
            classify_message("Output blocked by content_filter").kind,
            ErrorKind::ContentFilter
        );
        assert_eq!(classify_message("something odd").kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_retryable_flags() {
        assert!(classify_message("connection reset").retryable);
        assert!(classify_message("too many requests").retryable);
        assert!(classify_message("503 service unavailable").retryable);
        assert!(classify_message("mystery").retryable);
        assert!(!classify_message("unauthorized").retryable);
        assert!(!classify_message("insufficient_quota").retryable);
        assert!(!classify_message("content policy violation").retryable);
    }

    #[test]
    fn test_typed_errors_keep_their_kind() {
        let err = GenerationError::circuit_open("open");
        let c = classify(&err);
        assert_eq!(c.kind, ErrorKind::BreakerOpen);
        assert!(!c.retryable);

        let err = GenerationError::parsing("bad json");
        assert_eq!(classify(&err).kind, ErrorKind::ParseFailure);
        assert!(!classify(&err).retryable);
    }

    #[test]
    fn test_unknown_errors_are_reclassified_by_message() {
        let err = GenerationError::unknown("upstream said: rate limit exceeded")
            .with_context_value("attempt", 1);
        assert_eq!(classify(&err).kind, ErrorKind::RateLimit);
    }

    #[test]
    fn test_map_http_error_by_status() {
        let body = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert_eq!(map_http_error(StatusCode::UNAUTHORIZED, body).kind(), ErrorKind::Auth);

        let body = r#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#;
        assert_eq!(map_http_error(StatusCode::TOO_MANY_REQUESTS, body).kind(), ErrorKind::Quota);

        let body = r#"{"error":{"message":"Rate limit reached"}}"#;
        assert_eq!(
            map_http_error(StatusCode::TOO_MANY_REQUESTS, body).kind(),
            ErrorKind::RateLimit
        );

        assert_eq!(map_http_error(StatusCode::BAD_GATEWAY, "").kind(), ErrorKind::Server);
        assert_eq!(
            map_http_error(StatusCode::BAD_REQUEST, r#"{"message":"content_filter triggered"}"#)
                .kind(),
            ErrorKind::ContentFilter
        );
    }
}
