//! Identity of the signed-in user.
//!
//! Sign-in itself happens elsewhere; the client only needs the active user's
//! email to attribute persisted messages.

/// Supplies the active user's email, if anyone is signed in.
pub trait IdentityProvider: Send + Sync {
    /// Email of the signed-in user.
    fn email(&self) -> Option<String>;
}

/// Identity fixed at startup (from config, environment or CLI flag).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    email: Option<String>,
}

impl StaticIdentity {
    /// Signed in as `email`. Blank emails count as signed out.
    pub fn new(email: Option<String>) -> Self {
        Self {
            email: email.filter(|e| !e.trim().is_empty()),
        }
    }

    /// Nobody signed in.
    pub fn anonymous() -> Self {
        Self { email: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn email(&self) -> Option<String> {
        self.email.clone()
    }
}
