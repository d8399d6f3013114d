use std::sync::Arc;

use uuid::Uuid;

use crate::domain::user::{normalize_email, User};
use crate::error::{Entity, ShopError, ShopResult, ValidationError};
use crate::store::UserStore;

/// Password hashing is supplied by the embedding application.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> anyhow::Result<String>;

    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool>;
}

/// Account registration, login and lookup.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ShopResult<User> {
        if password.is_empty() {
            return Err(ValidationError::InvalidPassword.into());
        }
        let email = normalize_email(email)?;
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(ShopError::AlreadyExists(Entity::User));
        }

        let hash = self.hasher.hash(password).map_err(ShopError::infrastructure)?;
        let user = User::new(name, &email, hash)?;
        // The unique index still guards a concurrent registration of the same email
        self.users.create(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, email: &str, password: &str) -> ShopResult<User> {
        let Some(user) = self.users.get_by_email(email.trim()).await? else {
            tracing::debug!("Login for unknown email");
            return Err(ValidationError::InvalidCredentials.into());
        };

        let verified = self
            .hasher
            .verify(password, &user.password_hash)
            .map_err(ShopError::infrastructure)?;
        if !verified {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(ValidationError::InvalidCredentials.into());
        }

        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> ShopResult<User> {
        self.users.get_by_id(id).await
    }

    pub async fn list_users(&self) -> ShopResult<Vec<User>> {
        self.users.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    /// Reversible stand-in, enough to tell passwords apart.
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> anyhow::Result<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
            Ok(hash == format!("hashed:{password}"))
        }
    }

    struct BrokenHasher;

    impl PasswordHasher for BrokenHasher {
        fn hash(&self, _password: &str) -> anyhow::Result<String> {
            anyhow::bail!("hasher unavailable")
        }

        fn verify(&self, _password: &str, _hash: &str) -> anyhow::Result<bool> {
            anyhow::bail!("hasher unavailable")
        }
    }

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryStore::new()), Arc::new(PlainHasher))
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let users = service();

        let user = users.register("Ada", "ada@example.com", "s3cret").await.unwrap();
        assert_eq!(user.password_hash, "hashed:s3cret");

        let logged_in = users.login("ada@example.com", "s3cret").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(users.get_user(user.id).await.unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let users = service();
        users.register("Ada", "ada@example.com", "s3cret").await.unwrap();

        let err = users.register("Ada", " ada@example.com", "other").await.unwrap_err();
        assert!(matches!(err, ShopError::AlreadyExists(Entity::User)));
        assert_eq!(users.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let users = service();

        let err = users.register("Ada", "ada@example.com", "").await.unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::InvalidPassword));

        let err = users.register("", "ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::InvalidName));

        let err = users.register("Ada", "not-an-email", "pw").await.unwrap_err();
        assert!(matches!(err.validation(), Some(ValidationError::InvalidEmail(_))));

        assert!(users.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let users = service();
        users.register("Ada", "ada@example.com", "s3cret").await.unwrap();

        let wrong_password = users.login("ada@example.com", "guess").await.unwrap_err();
        let unknown_email = users.login("bob@example.com", "s3cret").await.unwrap_err();

        assert_eq!(wrong_password.validation(), Some(&ValidationError::InvalidCredentials));
        assert_eq!(unknown_email.validation(), Some(&ValidationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_hasher_failure_is_infrastructure() {
        let users = UserService::new(Arc::new(InMemoryStore::new()), Arc::new(BrokenHasher));

        let err = users.register("Ada", "ada@example.com", "s3cret").await.unwrap_err();
        assert!(matches!(err, ShopError::Infrastructure(_)));
        assert!(users.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let err = service().get_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound { entity: Entity::User, .. }));
    }
}
