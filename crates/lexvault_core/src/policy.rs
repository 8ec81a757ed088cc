//! crates/lexvault_core/src/policy.rs
//!
//! Tunable limits and credentials for the workspace. The api service builds this from
//! its environment configuration; the core never reads the environment itself.

use chrono::Duration;

/// The fixed administrative credential. Admin identities are synthesized at login and
/// never stored alongside regular users.
#[derive(Debug, Clone)]
pub struct AdminCredential {
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct WorkspacePolicy {
    pub admin: Option<AdminCredential>,
    /// Universal verification code for staging environments. `None` in production.
    pub verification_bypass_code: Option<String>,
    pub notification_retention: Duration,
    pub audit_log_capacity: usize,
    pub vault_max_pin_attempts: u32,
    pub vault_lockout: Duration,
    pub session_ttl: Duration,
    pub inactivity_limit: Duration,
}

impl Default for WorkspacePolicy {
    fn default() -> Self {
        Self {
            admin: None,
            verification_bypass_code: None,
            notification_retention: Duration::days(30),
            audit_log_capacity: 500,
            vault_max_pin_attempts: 5,
            vault_lockout: Duration::minutes(15),
            session_ttl: Duration::days(30),
            inactivity_limit: Duration::minutes(15),
        }
    }
}
