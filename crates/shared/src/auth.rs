//! Authentication claims carried by bearer tokens.
//!
//! Token issuance belongs to the identity service; this crate only needs the
//! claim shape to identify the calling employee.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee ID, e.g. `EMP0042`).
    pub sub: String,
    /// Employee's organisational role (e.g. `Manager`).
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for an employee.
    #[must_use]
    pub fn new(employee_id: &str, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: employee_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the employee ID from claims.
    #[must_use]
    pub fn employee_id(&self) -> &str {
        &self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let expires_at = Utc::now() + Duration::hours(1);
        let claims = Claims::new("EMP0001", "Manager", expires_at);

        assert_eq!(claims.employee_id(), "EMP0001");
        assert_eq!(claims.role, "Manager");
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }
}
