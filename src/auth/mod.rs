pub mod credentials;
pub mod token;

pub use credentials::CredentialStore;
pub use token::{Claims, TokenError, TokenService, DEFAULT_TOKEN_TTL};

use crate::audit::AuditSink;
use crate::{GatewayError, Result};
use tracing::{debug, info};

/// Login and token verification, the only auth boundary of the gateway
pub struct Authenticator {
    credentials: CredentialStore,
    tokens: TokenService,
    audit: AuditSink,
}

impl Authenticator {
    pub fn new(credentials: CredentialStore, tokens: TokenService, audit: AuditSink) -> Self {
        Self {
            credentials,
            tokens,
            audit,
        }
    }

    /// Check `username`/`password` and issue a session token.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        if !self.credentials.verify(username, password) {
            debug!("Rejected login for {}", username);
            return Err(GatewayError::InvalidCredentials);
        }

        let token = self.tokens.issue(username)?;
        info!("Issued token for {}", username);
        self.audit.login(username);

        Ok(token)
    }

    /// Verify a bearer token and return the username it was issued to
    pub fn verify(&self, token: &str) -> std::result::Result<String, TokenError> {
        self.tokens.verify(token)
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::SharedBuffer;

    fn authenticator(buffer: &SharedBuffer) -> Authenticator {
        Authenticator::new(
            [("alice", "p1")].into_iter().collect(),
            TokenService::new(b"secret", DEFAULT_TOKEN_TTL),
            AuditSink::new(buffer.clone()),
        )
    }

    #[test]
    fn test_login_issues_verifiable_token() {
        let buffer = SharedBuffer::default();
        let auth = authenticator(&buffer);

        let token = auth.login("alice", "p1").unwrap();
        assert_eq!(auth.verify(&token).unwrap(), "alice");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "login");
        assert_eq!(lines[0]["user"], "alice");
    }

    #[test]
    fn test_wrong_password_and_unknown_user_fail_alike() {
        let buffer = SharedBuffer::default();
        let auth = authenticator(&buffer);

        for (user, pass) in [("alice", "nope"), ("ALICE", "p1"), ("mallory", "p1")] {
            let err = auth.login(user, pass).unwrap_err();
            assert!(matches!(err, GatewayError::InvalidCredentials));
            assert_eq!(err.to_string(), "Incorrect username or password");
        }
        assert!(buffer.lines().is_empty());
    }
}
