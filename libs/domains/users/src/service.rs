use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum_helpers::{AppError, AuthUser, JwtAuth, TokenValidator};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{
    LoginRequest, LoginResponse, NewUser, RegisterRequest, UpdateProfile, User, UserChanges,
};
use crate::repository::UserRepository;

/// Registration, login and profile logic
#[derive(Clone)]
pub struct AuthService<R: UserRepository> {
    repository: Arc<R>,
    jwt: JwtAuth,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repository: R, jwt: JwtAuth) -> Self {
        Self {
            repository: Arc::new(repository),
            jwt,
        }
    }

    /// Create an account. Username is checked before email.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterRequest) -> UserResult<User> {
        if self
            .repository
            .get_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(UserError::DuplicateUsername);
        }
        if self.repository.get_by_email(&input.email).await?.is_some() {
            return Err(UserError::DuplicateEmail);
        }

        let password_hash = hash_password(&input.password)?;

        self.repository
            .create(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
            })
            .await
    }

    /// Verify credentials and issue an access token
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<LoginResponse> {
        let Some(user) = self.repository.get_by_email(&input.email).await? else {
            // Same Argon2 cost as a wrong password
            verify_password(&input.password, DUMMY_PASSWORD_HASH)?;
            return Err(UserError::InvalidCredentials);
        };

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        let access_token = self
            .jwt
            .issue_token(user.id, &user.email, &user.username)
            .map_err(|e| UserError::Token(e.to_string()))?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    /// Resolve a token to the user it was issued for, with current username and email.
    pub async fn validate(&self, token: &str) -> UserResult<AuthUser> {
        let claims = self.jwt.verify_token(token).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            UserError::InvalidToken
        })?;
        let user_id = claims.user_id().ok_or(UserError::InvalidToken)?;

        let user = self
            .repository
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::InvalidToken)?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            username: user.username,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: i32) -> UserResult<User> {
        self.repository
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))
    }

    /// Apply a partial profile update.
    ///
    /// Username and email are re-checked only when they differ from the stored value.
    #[instrument(skip(self, input))]
    pub async fn update_profile(&self, user_id: i32, input: UpdateProfile) -> UserResult<User> {
        let current = self.get_profile(user_id).await?;

        let username = input.username.filter(|name| *name != current.username);
        if let Some(ref username) = username {
            if self.repository.get_by_username(username).await?.is_some() {
                return Err(UserError::DuplicateUsername);
            }
        }

        let email = input.email.filter(|email| *email != current.email);
        if let Some(ref email) = email {
            if self.repository.get_by_email(email).await?.is_some() {
                return Err(UserError::DuplicateEmail);
            }
        }

        let password_hash = match input.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        self.repository
            .update(
                user_id,
                UserChanges {
                    username,
                    email,
                    password_hash,
                    avatar: input.avatar,
                },
            )
            .await
    }
}

#[async_trait]
impl<R: UserRepository> TokenValidator for AuthService<R> {
    async fn validate_token(&self, token: &str) -> Result<AuthUser, AppError> {
        self.validate(token).await.map_err(Into::into)
    }
}

// Password helpers

/// Argon2id hash with the default parameters that matches no password, verified against
/// when a login names an unknown email.
const DUMMY_PASSWORD_HASH: &str = concat!(
    "$argon2id$v=19$m=19456,t=2,p=1$",
    "c29tZXNhbHRzb21lc2FsdA$",
    "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
);

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryUserRepository, MockUserRepository};
    use axum_helpers::JwtConfig;
    use chrono::Utc;
    use mockall::predicate::eq;

    const SECRET: &str = "unit-test-secret-that-is-long-enough";

    fn jwt() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET))
    }

    fn register_input(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "secret1".into(),
        }
    }

    fn stored_user(id: i32, username: &str, email: &str) -> User {
        User {
            id,
            username: username.into(),
            email: email.into(),
            password_hash: hash_password("secret1").unwrap(),
            avatar: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert_ne!(hash, "secret1");
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username_before_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_username()
            .with(eq("alice"))
            .returning(|_| Ok(Some(stored_user(1, "alice", "alice@example.com"))));
        repo.expect_get_by_email().never();
        repo.expect_create().never();

        let service = AuthService::new(repo, jwt());
        let result = service
            .register(register_input("alice", "alice@example.com"))
            .await;

        assert!(matches!(result, Err(UserError::DuplicateUsername)));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_username().returning(|_| Ok(None));
        repo.expect_get_by_email()
            .returning(|_| Ok(Some(stored_user(1, "alice", "alice@example.com"))));
        repo.expect_create().never();

        let service = AuthService::new(repo, jwt());
        let result = service
            .register(register_input("bob", "alice@example.com"))
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_username().returning(|_| Ok(None));
        repo.expect_get_by_email().returning(|_| Ok(None));
        repo.expect_create()
            .withf(|input| input.password_hash.starts_with("$argon2") && input.username == "bob")
            .returning(|input| {
                Ok(User {
                    id: 5,
                    username: input.username,
                    email: input.email,
                    password_hash: input.password_hash,
                    avatar: String::new(),
                    created_at: Utc::now(),
                })
            });

        let service = AuthService::new(repo, jwt());
        let user = service
            .register(register_input("bob", "bob@example.com"))
            .await
            .unwrap();

        assert_eq!(user.id, 5);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = AuthService::new(InMemoryUserRepository::new(), jwt());
        service
            .register(register_input("alice", "alice@example.com"))
            .await
            .unwrap();

        let wrong_password = service
            .login(LoginRequest {
                email: "alice@example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginRequest {
                email: "nobody@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, UserError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[test]
    fn test_unknown_email_hash_parses_and_never_matches() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert_eq!(parsed.hash.map(|h| h.len()), Some(32));

        for password in ["", "secret1", "password"] {
            assert!(!verify_password(password, DUMMY_PASSWORD_HASH).unwrap());
        }
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_a_password() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email()
            .withf(|email| email == "ghost@example.com")
            .returning(|_| Ok(None));

        let service = AuthService::new(mock, jwt());
        let err = service
            .login(LoginRequest {
                email: "ghost@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();

        // a malformed fallback hash would surface as PasswordHash instead
        assert!(matches!(err, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_token_validates_to_current_identity() {
        let service = AuthService::new(InMemoryUserRepository::new(), jwt());
        let user = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .unwrap();

        let login = service
            .login(LoginRequest {
                email: "alice@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, user.id);

        service
            .update_profile(
                user.id,
                UpdateProfile {
                    username: Some("alice2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let identity = service.validate(&login.access_token).await.unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.username, "alice2");
    }

    #[tokio::test]
    async fn test_validate_rejects_token_of_deleted_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id().with(eq(42)).returning(|_| Ok(None));

        let token = jwt().issue_token(42, "ghost@example.com", "ghost").unwrap();
        let service = AuthService::new(repo, jwt());

        let result = service.validate(&token).await;
        assert!(matches!(result, Err(UserError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_validate_rejects_garbage_and_foreign_signatures() {
        let service = AuthService::new(InMemoryUserRepository::new(), jwt());
        assert!(matches!(
            service.validate("not-a-token").await,
            Err(UserError::InvalidToken)
        ));

        let other = JwtAuth::new(&JwtConfig::new("another-secret-that-is-long-enough!!"));
        let forged = other.issue_token(1, "a@example.com", "a").unwrap();
        assert!(matches!(
            service.validate(&forged).await,
            Err(UserError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_update_profile_checks_uniqueness_only_on_change() {
        let service = AuthService::new(InMemoryUserRepository::new(), jwt());
        let alice = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .unwrap();
        service
            .register(register_input("bob", "bob@example.com"))
            .await
            .unwrap();

        let unchanged = service
            .update_profile(
                alice.id,
                UpdateProfile {
                    username: Some("alice".into()),
                    email: Some("alice@example.com".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(unchanged.is_ok());

        let clash = service
            .update_profile(
                alice.id,
                UpdateProfile {
                    username: Some("bob".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(UserError::DuplicateUsername)));
    }

    #[tokio::test]
    async fn test_update_profile_rehashes_password() {
        let service = AuthService::new(InMemoryUserRepository::new(), jwt());
        let alice = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .unwrap();

        service
            .update_profile(
                alice.id,
                UpdateProfile {
                    password: Some("newsecret".into()),
                    avatar: Some("https://example.com/a.png".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let login = service
            .login(LoginRequest {
                email: "alice@example.com".into(),
                password: "newsecret".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.avatar, "https://example.com/a.png");
    }

    #[tokio::test]
    async fn test_get_profile_of_missing_user() {
        let service = AuthService::new(InMemoryUserRepository::new(), jwt());
        let result = service.get_profile(7).await;
        assert!(matches!(result, Err(UserError::NotFound(7))));
    }
}
