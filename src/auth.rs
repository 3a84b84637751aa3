//! Account verification and maintenance
//!
//! Credentials are bcrypt hashes; login fetches the account by email
//! and verifies the hash locally, so a statement never carries or
//! compares plaintext. Login failure is a single opaque error: callers
//! can say "Invalid credentials" and nothing more.

use crate::backend::schema::HASH_COST;
use crate::model::{Role, UserProfile};
use crate::{Database, Error, Result, queries};

/// Signup forms must clear this bar before any statement runs.
pub const MIN_PASSWORD_LEN: usize = 6;

/// New-account form payload
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub location: Option<String>,
    pub organization: Option<String>,
}

pub struct AuthService {
    db: Database,
}

impl AuthService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Verify credentials and hand back the session profile.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let user = queries::find_user_by_email(&self.db, email)
            .await?
            .ok_or(Error::InvalidCredentials)?;
        let stored = user.password.as_deref().ok_or(Error::InvalidCredentials)?;
        if !bcrypt::verify(password, stored).unwrap_or(false) {
            return Err(Error::InvalidCredentials);
        }
        Ok(user.into_profile())
    }

    /// Validate a signup form, hash the password and create the
    /// account. Returns the new profile, ready for a session.
    pub async fn register(&self, signup: Signup) -> Result<UserProfile> {
        let name = signup.name.trim();
        let email = signup.email.trim();
        if name.is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        if email.is_empty() {
            return Err(Error::Validation("Email is required".to_string()));
        }
        validate_password(&signup.password, &signup.confirm_password)?;
        if queries::find_user_by_email(&self.db, email).await?.is_some() {
            return Err(Error::Validation(
                "An account with this email already exists".to_string(),
            ));
        }

        let hash = bcrypt::hash(&signup.password, HASH_COST)?;
        queries::insert_user(
            &self.db,
            name,
            email,
            &hash,
            signup.role.as_str(),
            signup.location.as_deref(),
            signup.organization.as_deref(),
        )
        .await?;

        let user = queries::find_user_by_email(&self.db, email)
            .await?
            .ok_or_else(|| Error::Statement("account vanished after insert".to_string()))?;
        Ok(user.into_profile())
    }

    /// Change a password after re-verifying the current one.
    pub async fn change_password(
        &self,
        user_id: i64,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<()> {
        validate_password(new_password, confirm)?;

        let rows = self
            .db
            .query(
                "SELECT password FROM users WHERE id = ?1",
                &[serde_json::json!(user_id)],
            )
            .await?;
        let stored = rows
            .first()
            .and_then(|row| row.get("password"))
            .and_then(|v| v.as_str())
            .ok_or(Error::InvalidCredentials)?;
        if !bcrypt::verify(current, stored).unwrap_or(false) {
            return Err(Error::InvalidCredentials);
        }

        let hash = bcrypt::hash(new_password, HASH_COST)?;
        self.db
            .run(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                &[serde_json::json!(hash), serde_json::json!(user_id)],
            )
            .await?;
        Ok(())
    }

    /// Self-service role switch - the platform's only authorization
    /// signal changes with it.
    pub async fn switch_role(&self, user_id: i64, role: Role) -> Result<UserProfile> {
        self.db
            .run(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                &[serde_json::json!(role.as_str()), serde_json::json!(user_id)],
            )
            .await?;
        let rows = self
            .db
            .query(
                "SELECT * FROM users WHERE id = ?1",
                &[serde_json::json!(user_id)],
            )
            .await?;
        let user: crate::model::User = crate::model::from_row(
            rows.into_iter()
                .next()
                .ok_or_else(|| Error::Validation(format!("No such user: {}", user_id)))?,
        )?;
        Ok(user.into_profile())
    }
}

fn validate_password(password: &str, confirm: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirm {
        return Err(Error::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EphemeralBackend;
    use crate::backend::schema::SEED_USER_PASSWORD;

    fn service() -> AuthService {
        let db = Database::with_backend(Box::new(EphemeralBackend::new().unwrap()));
        AuthService::new(db)
    }

    fn signup(email: &str) -> Signup {
        Signup {
            name: "New Farmer".to_string(),
            email: email.to_string(),
            password: "growwell".to_string(),
            confirm_password: "growwell".to_string(),
            role: Role::Farmer,
            location: Some("Indore".to_string()),
            organization: None,
        }
    }

    #[tokio::test]
    async fn test_login_with_seeded_account() {
        let auth = service();
        let profile = auth
            .login("ravi@agriconnect.in", SEED_USER_PASSWORD)
            .await
            .unwrap();
        assert_eq!(profile.name, "Ravi Kumar");
        assert_eq!(profile.role, Role::Farmer);
    }

    #[tokio::test]
    async fn test_login_failure_is_opaque() {
        let auth = service();

        let wrong_password = auth
            .login("ravi@agriconnect.in", "not-the-password")
            .await
            .unwrap_err();
        let unknown_email = auth
            .login("nobody@agriconnect.in", SEED_USER_PASSWORD)
            .await
            .unwrap_err();

        // Same error either way: the caller cannot tell which field
        // was wrong.
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let profile = auth.register(signup("neha@agriconnect.in")).await.unwrap();
        assert_eq!(profile.role, Role::Farmer);

        let again = auth
            .login("neha@agriconnect.in", "growwell")
            .await
            .unwrap();
        assert_eq!(again.id, profile.id);
    }

    #[tokio::test]
    async fn test_register_validations() {
        let auth = service();

        let mut short = signup("short@agriconnect.in");
        short.password = "abc".to_string();
        short.confirm_password = "abc".to_string();
        assert!(matches!(
            auth.register(short).await.unwrap_err(),
            Error::Validation(_)
        ));

        let mut mismatch = signup("mismatch@agriconnect.in");
        mismatch.confirm_password = "different".to_string();
        assert!(matches!(
            auth.register(mismatch).await.unwrap_err(),
            Error::Validation(_)
        ));

        let mut unnamed = signup("unnamed@agriconnect.in");
        unnamed.name = "  ".to_string();
        assert!(matches!(
            auth.register(unnamed).await.unwrap_err(),
            Error::Validation(_)
        ));

        // Seeded email is already taken.
        assert!(matches!(
            auth.register(signup("ravi@agriconnect.in")).await.unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let auth = service();

        let denied = auth
            .change_password(2, "wrong-current", "newpassword", "newpassword")
            .await
            .unwrap_err();
        assert!(matches!(denied, Error::InvalidCredentials));

        auth.change_password(2, SEED_USER_PASSWORD, "newpassword", "newpassword")
            .await
            .unwrap();
        auth.login("ravi@agriconnect.in", "newpassword")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_switch_role() {
        let auth = service();
        let profile = auth.switch_role(2, Role::Expert).await.unwrap();
        assert_eq!(profile.role, Role::Expert);
    }
}
