use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::auth::{generate_token, AuthError, Claims};
use crate::database::models::{PublicUserProfile, User, UserProfile};
use crate::database::store::{CatalogStore, StoreError};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `identifier` accepts either a username or an email address.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn validate_username(username: &str) -> Result<(), UserError> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(UserError::Validation(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }
    Ok(())
}

// Deliberately loose: the confirmation email is the real validator
fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut halves = email.splitn(2, '@');
    match (halves.next(), halves.next()) {
        (Some(local), Some(domain)) => {
            !local.is_empty() && !domain.is_empty() && domain.contains('.')
        }
        _ => false,
    }
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < 6 {
        return Err(UserError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

pub struct UserService<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: CatalogStore> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserProfile, UserError> {
        validate_username(&req.username)?;
        if !valid_email(&req.email) {
            return Err(UserError::Validation(
                "Email address is not valid".to_string(),
            ));
        }
        validate_password(&req.password)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: req.username,
            email: req.email,
            password_hash: hash_password(&req.password)?,
            profile_picture: None,
            bio: None,
            created_at: now,
            updated_at: now,
        };

        self.store.create_user(&user).await.map_err(|e| match e {
            StoreError::UniqueViolation { ref constraint } if constraint == "users_username_key" => {
                UserError::Conflict("Username is already taken".to_string())
            }
            StoreError::UniqueViolation { ref constraint } if constraint == "users_email_key" => {
                UserError::Conflict("Email is already registered".to_string())
            }
            other => UserError::Store(other),
        })?;

        Ok(user.into())
    }

    /// An unknown identifier and a wrong password produce the same error,
    /// so login cannot be used to enumerate accounts.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, UserError> {
        let user = self
            .store
            .user_by_identifier(&req.identifier)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        let token = generate_token(Claims::new(user.id, user.email.clone()))?;
        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserProfile, UserError> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;
        Ok(user.into())
    }

    pub async fn public_profile(&self, user_id: Uuid) -> Result<PublicUserProfile, UserError> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> UserService<MemoryStore> {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    fn register_req(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_with_username_and_email() {
        let svc = service();
        let profile = svc
            .register(register_req("casey", "casey@example.test"))
            .await
            .unwrap();
        assert_eq!(profile.username, "casey");

        let by_username = svc
            .login(LoginRequest {
                identifier: "casey".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(by_username.user.id, profile.id);
        assert!(!by_username.token.is_empty());

        let by_email = svc
            .login(LoginRequest {
                identifier: "casey@example.test".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(by_email.user.id, profile.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_identical() {
        let svc = service();
        svc.register(register_req("casey", "casey@example.test"))
            .await
            .unwrap();

        let wrong = svc
            .login(LoginRequest {
                identifier: "casey".to_string(),
                password: "not-it".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = svc
            .login(LoginRequest {
                identifier: "nobody".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_username_and_email_report_which_field() {
        let svc = service();
        svc.register(register_req("casey", "casey@example.test"))
            .await
            .unwrap();

        let err = svc
            .register(register_req("casey", "other@example.test"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username is already taken");

        let err = svc
            .register(register_req("riley", "casey@example.test"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email is already registered");
    }

    #[tokio::test]
    async fn register_validation_rejects_bad_inputs() {
        let svc = service();

        assert!(matches!(
            svc.register(register_req("ab", "ab@example.test")).await,
            Err(UserError::Validation(_))
        ));
        assert!(matches!(
            svc.register(register_req("casey", "not-an-email")).await,
            Err(UserError::Validation(_))
        ));
        assert!(matches!(
            svc.register(register_req("casey", "casey@nodotdomain")).await,
            Err(UserError::Validation(_))
        ));

        let mut short = register_req("casey", "casey@example.test");
        short.password = "tiny".to_string();
        assert!(matches!(
            svc.register(short).await,
            Err(UserError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn public_profile_has_no_email() {
        let svc = service();
        let profile = svc
            .register(register_req("casey", "casey@example.test"))
            .await
            .unwrap();

        let public = svc.public_profile(profile.id).await.unwrap();
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["username"], "casey");
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.me(Uuid::new_v4()).await,
            Err(UserError::NotFound)
        ));
        assert!(matches!(
            svc.public_profile(Uuid::new_v4()).await,
            Err(UserError::NotFound)
        ));
    }

    #[test]
    fn email_shapes() {
        assert!(valid_email("a@b.co"));
        assert!(valid_email("first.last@sub.example.test"));
        assert!(!valid_email("a@b"));
        assert!(!valid_email("@b.co"));
        assert!(!valid_email("a@"));
        assert!(!valid_email("a b@c.co"));
        assert!(!valid_email("no-at-sign.co"));
    }
}
