//! Status classification for the HTTP backend fallback.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Status code returned by the game backend.
///
/// Kept as a number so retry decisions never parse error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 4xx: the request itself is wrong, retrying cannot help.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.0, 429 | 502 | 503 | 504)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl Display for HttpStatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "HTTP {}", self.0)
    }
}
