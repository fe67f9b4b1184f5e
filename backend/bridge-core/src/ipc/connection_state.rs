//! Per-connection authentication state.

use common::RedactedToken;

pub(crate) struct ConnectionState {
    authenticated: bool,
    expected_token: RedactedToken,
}

impl ConnectionState {
    pub(crate) fn new(token: RedactedToken) -> Self {
        Self {
            authenticated: false,
            expected_token: token,
        }
    }

    /// Mark the connection authenticated when `token` matches.
    pub(crate) fn validate_token(&mut self, token: &str) -> bool {
        self.authenticated = self.expected_token.matches(token);
        self.authenticated
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
