use thiserror::Error;

/// Failure at a collaborator boundary (media server, transport, enrichment).
///
/// Collaborator errors are never fatal to the process: callers log them and
/// skip the current candidate or degrade the message.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status} for {context}")]
    Status {
        service: &'static str,
        status: u16,
        context: String,
    },

    #[error("failed to decode {service} response: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl SourceError {
    pub fn status(service: &'static str, status: u16, context: impl Into<String>) -> Self {
        Self::Status {
            service,
            status,
            context: context.into(),
        }
    }

    pub fn decode(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Decode {
            service,
            detail: detail.into(),
        }
    }
}
