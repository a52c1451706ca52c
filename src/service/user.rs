//! User service
//!
//! Registration, login, and self-service profile edits.

use std::sync::Arc;

use crate::auth::{hash_password, issue_token, verify_password};
use crate::config::AuthConfig;
use crate::data::{Database, EntityId, FollowSets, User, UserPatch};
use crate::error::AppError;
use crate::metrics::{LOGINS_TOTAL, USERS_REGISTERED_TOTAL};

/// Requested changes to the caller's own account
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn normalize_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    Ok(trimmed.to_string())
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }
    Ok(())
}

/// User service
pub struct UserService {
    db: Arc<Database>,
    auth: AuthConfig,
}

impl UserService {
    /// Create new user service
    pub fn new(db: Arc<Database>, auth: AuthConfig) -> Self {
        Self { db, auth }
    }

    /// Register a new user
    ///
    /// # Errors
    /// `Validation` for a blank name, malformed email or empty password;
    /// `Conflict` if the email is taken
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        let name = normalize_name(name)?;
        let email = normalize_email(email)?;
        check_password(password)?;

        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        let password_hash = hash_password(password, self.auth.bcrypt_cost).await?;
        let user = User {
            id: EntityId::new().0,
            name,
            email,
            password_hash,
            created_at: chrono::Utc::now(),
        };

        // The unique index still guards against a concurrent registration.
        self.db.insert_user(&user).await?;
        USERS_REGISTERED_TOTAL.inc();
        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    /// Exchange email and password for a bearer token
    ///
    /// Unknown email and wrong password are both `Unauthorized`.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let Some(user) = self.db.get_user_by_email(email.trim()).await? else {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            return Err(AppError::Unauthorized);
        };

        if !verify_password(password, &user.password_hash).await {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::Unauthorized);
        }

        let token = issue_token(&user.id, &self.auth.token_secret, self.auth.token_max_age)?;
        LOGINS_TOTAL.with_label_values(&["success"]).inc();
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(token)
    }

    /// All users with their follow sets
    pub async fn list(&self) -> Result<Vec<(User, FollowSets)>, AppError> {
        let users = self.db.list_users().await?;
        self.with_follow_sets(users).await
    }

    /// Users sharing a display name
    ///
    /// # Errors
    /// `NotFound` if nobody has that name
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<(User, FollowSets)>, AppError> {
        let users = self.db.find_users_by_name(name).await?;
        if users.is_empty() {
            return Err(AppError::NotFound);
        }
        self.with_follow_sets(users).await
    }

    /// Apply `update` to the caller's account, addressed by name
    pub async fn update_self(
        &self,
        actor_id: &str,
        name: &str,
        update: UserUpdate,
    ) -> Result<(User, FollowSets), AppError> {
        let user = self.resolve_self(actor_id, name).await?;

        let password_hash = match update.password.as_deref() {
            Some(password) => {
                check_password(password)?;
                Some(hash_password(password, self.auth.bcrypt_cost).await?)
            }
            None => None,
        };
        let patch = UserPatch {
            name: update.name.as_deref().map(normalize_name).transpose()?,
            email: update.email.as_deref().map(normalize_email).transpose()?,
            password_hash,
        };

        if !self.db.update_user(&user.id, &patch).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(user_id = %user.id, "User updated");

        let updated = self.db.get_user(&user.id).await?.ok_or(AppError::NotFound)?;
        let sets = self.db.get_follow_sets(&updated.id).await?;
        Ok((updated, sets))
    }

    /// Delete the caller's account, addressed by name
    pub async fn delete_self(&self, actor_id: &str, name: &str) -> Result<(), AppError> {
        let user = self.resolve_self(actor_id, name).await?;

        if !self.db.delete_user(&user.id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(user_id = %user.id, "User deleted");

        Ok(())
    }

    /// Names are not unique, so a name only ever addresses the caller.
    ///
    /// `Forbidden` if the name belongs to someone else only,
    /// `NotFound` if nobody has it.
    async fn resolve_self(&self, actor_id: &str, name: &str) -> Result<User, AppError> {
        let actor = self
            .db
            .get_user(actor_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if actor.name == name {
            return Ok(actor);
        }

        if self.db.find_users_by_name(name).await?.is_empty() {
            Err(AppError::NotFound)
        } else {
            Err(AppError::Forbidden)
        }
    }

    async fn with_follow_sets(&self, users: Vec<User>) -> Result<Vec<(User, FollowSets)>, AppError> {
        let ids: Vec<String> = users.iter().map(|user| user.id.clone()).collect();
        let mut sets = self.db.get_follow_sets_batch(&ids).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let user_sets = sets.remove(&user.id).unwrap_or_default();
                (user, user_sets)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_service() -> (UserService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let auth = AuthConfig {
            token_secret: "test-secret-key-that-is-32-bytes!".to_string(),
            token_max_age: 3600,
            bcrypt_cost: 4,
        };
        (UserService::new(Arc::new(db), auth), temp_dir)
    }

    #[test]
    fn email_needs_local_part_and_domain() {
        assert!(normalize_email(" ajs6@gmail.com ").is_ok());
        assert!(normalize_email("ajs6").is_err());
        assert!(normalize_email("@gmail.com").is_err());
        assert!(normalize_email("ajs6@").is_err());
    }

    #[tokio::test]
    async fn register_then_login() {
        let (service, _temp_dir) = create_service().await;

        let user = service
            .register("alex", "ajs6@gmail.com", "123456789")
            .await
            .unwrap();
        assert_ne!(user.password_hash, "123456789");

        assert!(service.login("ajs6@gmail.com", "123456789").await.is_ok());
        assert!(matches!(
            service.login("ajs6@gmail.com", "wrong").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            service.login("nobody@gmail.com", "123456789").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let (service, _temp_dir) = create_service().await;

        service.register("a", "dup@example.com", "pw").await.unwrap();
        assert!(matches!(
            service.register("b", "dup@example.com", "pw").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn name_addresses_only_the_caller() {
        let (service, _temp_dir) = create_service().await;

        let alex = service.register("alex", "a@example.com", "pw").await.unwrap();
        let paulo = service.register("paulo", "p@example.com", "pw").await.unwrap();

        assert!(matches!(
            service.delete_self(&alex.id, "paulo").await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service.delete_self(&alex.id, "ghost").await,
            Err(AppError::NotFound)
        ));

        let update = UserUpdate {
            name: Some("paulinho".to_string()),
            ..Default::default()
        };
        let (updated, _) = service.update_self(&paulo.id, "paulo", update).await.unwrap();
        assert_eq!(updated.name, "paulinho");
        assert_eq!(updated.email, "p@example.com");

        service.delete_self(&alex.id, "alex").await.unwrap();
        assert!(matches!(
            service.find_by_name("alex").await,
            Err(AppError::NotFound)
        ));
    }
}
