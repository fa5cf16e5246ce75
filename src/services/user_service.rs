use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::{self, Claims};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::store::{Store, User};
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
}

impl RegisterUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require_str("username", &self.username, 1, 100);
        v.require_str("password", &self.password, 1, 100);
        v.require_str("name", &self.name, 1, 100);
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginUserRequest {
    pub username: String,
    pub password: String,
}

impl LoginUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require_str("username", &self.username, 1, 100);
        v.require_str("password", &self.password, 1, 100);
        v.finish()
    }
}

/// Partial update: only the provided fields are touched.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.optional_str("name", self.name.as_deref(), 1, 100);
        v.optional_str("password", self.password.as_deref(), 1, 100);
        v.finish()
    }
}

/// User projection returned to clients; the hashed password never leaves
/// the service layer.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserResponse {
    fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            name: user.name.clone(),
            token: None,
        }
    }
}

pub struct UserService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Register a new account. The count pre-check gives the friendly
    /// error on the common path; the store's unique constraint is the
    /// authoritative guard and maps to the same outcome.
    pub async fn register(&self, request: RegisterUserRequest) -> Result<UserResponse, ApiError> {
        request.validate()?;

        let total = self.store.count_users_by_username(&request.username).await?;
        if total > 0 {
            return Err(ApiError::conflict("username already exist"));
        }

        let password = auth::hash_password(&request.password)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        let user = User {
            username: request.username,
            password,
            name: request.name,
        };

        let created = self.store.insert_user(&user).await?;
        tracing::debug!(username = %created.username, "registered user");

        Ok(UserResponse::from_user(&created))
    }

    /// Authenticate and issue a short-lived token. Unknown username and
    /// wrong password produce the identical message so usernames cannot
    /// be enumerated.
    pub async fn login(&self, request: LoginUserRequest) -> Result<UserResponse, ApiError> {
        request.validate()?;

        let user = self
            .store
            .find_user(&request.username)
            .await?
            .ok_or_else(|| ApiError::unauthorized("username or password is wrong"))?;

        if !auth::verify_password(&request.password, &user.password) {
            return Err(ApiError::unauthorized("username or password is wrong"));
        }

        let claims = Claims::new(user.clone(), self.config.security.jwt_expiry_mins);
        let token = auth::generate_token(&claims, &self.config.security.jwt_secret)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let mut response = UserResponse::from_user(&user);
        response.token = Some(token);
        Ok(response)
    }

    pub async fn update(
        &self,
        user: &User,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ApiError> {
        request.validate()?;

        let password = match request.password.as_deref() {
            Some(password) => {
                Some(auth::hash_password(password).map_err(|e| ApiError::internal(e.to_string()))?)
            }
            None => None,
        };

        let updated = self
            .store
            .update_user(&user.username, request.name.as_deref(), password.as_deref())
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;

        Ok(UserResponse::from_user(&updated))
    }

    pub fn get(&self, user: &User) -> UserResponse {
        UserResponse::from_user(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<UserResponse, ApiError> {
        let user = self
            .store
            .find_user(username)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;
        Ok(UserResponse::from_user(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, SecurityConfig, ServerConfig};
    use crate::store::MemoryStore;

    fn config() -> AppConfig {
        AppConfig {
            environment: Environment::Development,
            server: ServerConfig { port: 0 },
            security: SecurityConfig {
                jwt_secret: "test-secret".to_string(),
                jwt_expiry_mins: 5,
            },
        }
    }

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()), Arc::new(config()))
    }

    fn register_request() -> RegisterUserRequest {
        RegisterUserRequest {
            username: "alice".to_string(),
            password: "rahasia".to_string(),
            name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_duplicate_conflicts() {
        let service = service();
        let response = service.register(register_request()).await.unwrap();
        assert_eq!(response.username, "alice");
        assert!(response.token.is_none());

        let err = service.register(register_request()).await.unwrap_err();
        assert_eq!(err.message(), "username already exist");
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let service = service();
        service.register(register_request()).await.unwrap();

        let wrong_password = service
            .login(LoginUserRequest {
                username: "alice".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_user = service
            .login(LoginUserRequest {
                username: "ghost".to_string(),
                password: "rahasia".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.message(), unknown_user.message());
        assert_eq!(wrong_password.message(), "username or password is wrong");
    }

    #[tokio::test]
    async fn login_issues_a_decodable_token() {
        let service = service();
        service.register(register_request()).await.unwrap();

        let response = service
            .login(LoginUserRequest {
                username: "alice".to_string(),
                password: "rahasia".to_string(),
            })
            .await
            .unwrap();

        let token = response.token.expect("login should return a token");
        let claims = auth::decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user.username, "alice");
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let service = service();
        service.register(register_request()).await.unwrap();
        let user = service.store.find_user("alice").await.unwrap().unwrap();

        let response = service
            .update(
                &user,
                UpdateUserRequest {
                    name: Some("Alice B".to_string()),
                    password: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.name, "Alice B");

        // Password untouched, login still works with the original one
        service
            .login(LoginUserRequest {
                username: "alice".to_string(),
                password: "rahasia".to_string(),
            })
            .await
            .unwrap();
    }
}
