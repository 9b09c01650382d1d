use anyhow::{anyhow, Context};
use http::StatusCode;
use serde_json::json;

/// An error reported by the remote API
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Authentication required")]
    Unauthorized(Option<String>),

    #[error("Permission denied")]
    PermissionDenied(Option<String>),

    #[error("Not found")]
    NotFound(Option<String>),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Invalid(_) => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The message the server attached to this error, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Unknown(msg) | Error::Invalid(msg) => Some(msg.as_str()),
            Error::Unauthorized(msg) | Error::PermissionDenied(msg) | Error::NotFound(msg) => {
                msg.as_deref()
            }
            Error::NullByteInString(_) => None,
        }
        .filter(|m| !m.trim().is_empty())
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::NullByteInString(s) => json!({
                "error": "there was a null byte in argument string",
                "string": s,
            }),
            e => json!({
                "error": e.server_message().unwrap_or(""),
            }),
        })
        .expect("serializing error")
    }

    /// Interprets an unsuccessful response. Bodies that are not JSON, or JSON
    /// without a recognizable message, still produce an error of the right kind.
    pub fn parse(status: StatusCode, body: &[u8]) -> Error {
        let msg = match message_from(body) {
            Ok(msg) if !msg.trim().is_empty() => Some(msg),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(?err, ?status, "error response carried no message");
                None
            }
        };
        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized(msg),
            StatusCode::FORBIDDEN => Error::PermissionDenied(msg),
            StatusCode::NOT_FOUND => Error::NotFound(msg),
            s if s.is_client_error() => Error::Invalid(msg.unwrap_or_else(|| s.to_string())),
            s => Error::Unknown(msg.unwrap_or_else(|| s.to_string())),
        }
    }
}

fn message_from(body: &[u8]) -> anyhow::Result<String> {
    let data: serde_json::Value =
        serde_json::from_slice(body).context("parsing error contents")?;
    for key in ["error", "detail", "message"] {
        if let Some(msg) = data.get(key).and_then(|m| m.as_str()) {
            return Ok(String::from(msg));
        }
    }
    // field validation errors look like {"content": ["This field may not be blank."]}
    let fields = data
        .as_object()
        .ok_or_else(|| anyhow!("error contents is not an object"))?;
    let msgs = fields
        .iter()
        .filter_map(|(field, errs)| {
            let errs = errs.as_array()?;
            let errs = errs.iter().filter_map(|e| e.as_str()).collect::<Vec<_>>();
            (!errs.is_empty()).then(|| format!("{field}: {}", errs.join(" ")))
        })
        .collect::<Vec<_>>();
    if msgs.is_empty() {
        return Err(anyhow!("error contents has no message"));
    }
    Ok(msgs.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_drf_error_bodies() {
        assert_eq!(
            Error::parse(StatusCode::FORBIDDEN, br#"{"error": "not yours"}"#),
            Error::PermissionDenied(Some(String::from("not yours")))
        );
        assert_eq!(
            Error::parse(
                StatusCode::UNAUTHORIZED,
                br#"{"detail": "Invalid token."}"#
            ),
            Error::Unauthorized(Some(String::from("Invalid token.")))
        );
        assert_eq!(
            Error::parse(
                StatusCode::BAD_REQUEST,
                br#"{"content": ["This field may not be blank."]}"#
            ),
            Error::Invalid(String::from("content: This field may not be blank."))
        );
    }

    #[test]
    fn garbage_bodies_keep_the_status() {
        assert_eq!(
            Error::parse(StatusCode::NOT_FOUND, b"<html>nope</html>"),
            Error::NotFound(None)
        );
        let e = Error::parse(StatusCode::BAD_GATEWAY, b"");
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.server_message(), Some("502 Bad Gateway"));
    }

    #[test]
    fn server_messages() {
        assert_eq!(
            Error::Invalid(String::from("too long")).server_message(),
            Some("too long")
        );
        assert_eq!(Error::Unknown(String::from("  ")).server_message(), None);
        assert_eq!(
            Error::PermissionDenied(Some(String::from("not yours"))).server_message(),
            Some("not yours")
        );
        assert_eq!(Error::NotFound(None).server_message(), None);
    }

    #[test]
    fn contents_parse_back() {
        let e = Error::PermissionDenied(Some(String::from("no")));
        assert_eq!(Error::parse(e.status_code(), &e.contents()), e);
        let e = Error::NotFound(None);
        assert_eq!(Error::parse(e.status_code(), &e.contents()), e);
    }
}
