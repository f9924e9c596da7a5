// Auth service - Use cases for signing in and out against the remote API
use crate::application::air_quality_api::AccountApi;
use crate::domain::user::{AuthResponse, Credentials, Registration, User};
use crate::error::{ApiError, ApiResult};
use crate::infrastructure::session_store::SessionContext;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthService {
    api: Arc<dyn AccountApi>,
    session: SessionContext,
}

impl AuthService {
    pub fn new(api: Arc<dyn AccountApi>, session: SessionContext) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        let response = self.api.login(credentials).await?;
        tracing::info!("Signed in as {}", credentials.email);
        match self.store_tokens(response) {
            Some(user) => Ok(user),
            None => self.api.current_user().await,
        }
    }

    /// Returns the new user when the API signs them in right away
    pub async fn sign_up(&self, registration: &Registration) -> ApiResult<Option<User>> {
        let response = self.api.register(registration).await?;
        let issued_token = response.access.is_some();
        match self.store_tokens(response) {
            Some(user) => Ok(Some(user)),
            None if issued_token => self.api.current_user().await.map(Some),
            None => Ok(None),
        }
    }

    pub fn logout(&self) {
        self.session.purge();
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.api.current_user().await
    }

    /// Trade the stored refresh token for a new access token
    pub async fn refresh_access_token(&self) -> ApiResult<()> {
        let refresh = self
            .session
            .refresh_token()
            .ok_or(ApiError::MissingRefreshToken)?;
        let access = self.api.refresh_token(&refresh).await?;
        self.session.store_access_token(&access);
        Ok(())
    }

    /// Start-up check: resolve the stored token to a user, dropping it if rejected
    pub async fn restore(&self) -> Option<User> {
        if !self.session.is_signed_in() {
            return None;
        }
        match self.api.current_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Stored session rejected: {}", e);
                self.session.purge();
                None
            }
        }
    }

    fn store_tokens(&self, response: AuthResponse) -> Option<User> {
        if let Some(access) = &response.access {
            self.session.store_access_token(access);
        }
        if let Some(refresh) = &response.refresh {
            self.session.store_refresh_token(refresh);
        }
        response.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fakes::{FakeAccountApi, user};
    use crate::infrastructure::navigator::RecordingNavigator;
    use crate::infrastructure::session_store::MemorySessionStore;

    fn context() -> (SessionContext, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let session = SessionContext::new(Arc::new(MemorySessionStore::new()), navigator.clone());
        (session, navigator)
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "ops@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_stores_tokens() {
        let (session, _) = context();
        let api = FakeAccountApi {
            login_response: Some(AuthResponse {
                access: Some("acc".to_string()),
                refresh: Some("ref".to_string()),
                user: Some(user("admin")),
            }),
            ..Default::default()
        };
        let service = AuthService::new(Arc::new(api), session.clone());

        let signed_in = service.login(&credentials()).await.unwrap();

        assert_eq!(signed_in.role, "admin");
        assert_eq!(session.access_token().as_deref(), Some("acc"));
        assert_eq!(session.refresh_token().as_deref(), Some("ref"));
    }

    #[tokio::test]
    async fn test_login_fetches_user_when_missing() {
        let (session, _) = context();
        let api = FakeAccountApi {
            login_response: Some(AuthResponse {
                access: Some("acc".to_string()),
                refresh: None,
                user: None,
            }),
            current: Some(user("viewer")),
            ..Default::default()
        };
        let service = AuthService::new(Arc::new(api), session);

        assert_eq!(service.login(&credentials()).await.unwrap().role, "viewer");
    }

    #[tokio::test]
    async fn test_sign_up_without_tokens() {
        let (session, _) = context();
        let service = AuthService::new(Arc::new(FakeAccountApi::default()), session.clone());

        let registration = Registration {
            email: "new@example.com".to_string(),
            password: "pw".to_string(),
            username: None,
        };
        assert_eq!(service.sign_up(&registration).await.unwrap(), None);
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_logout_purges_without_navigation() {
        let (session, navigator) = context();
        session.store_access_token("acc");
        session.store_refresh_token("ref");
        let service = AuthService::new(Arc::new(FakeAccountApi::default()), session.clone());

        service.logout();

        assert!(session.access_token().is_none());
        assert!(session.refresh_token().is_none());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_access_token() {
        let (session, _) = context();
        session.store_access_token("old");
        session.store_refresh_token("ref");
        let api = Arc::new(FakeAccountApi {
            refreshed_access: Some("new".to_string()),
            ..Default::default()
        });
        let service = AuthService::new(api.clone(), session.clone());

        service.refresh_access_token().await.unwrap();

        assert_eq!(session.access_token().as_deref(), Some("new"));
        assert_eq!(*api.refresh_calls.lock().unwrap(), vec!["ref".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let (session, _) = context();
        let service = AuthService::new(Arc::new(FakeAccountApi::default()), session);

        assert!(matches!(
            service.refresh_access_token().await,
            Err(ApiError::MissingRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_restore_drops_rejected_token() {
        let (session, _) = context();
        session.store_access_token("expired");
        session.store_refresh_token("ref");
        let service = AuthService::new(Arc::new(FakeAccountApi::default()), session.clone());

        assert!(service.restore().await.is_none());
        assert!(!session.is_signed_in());
        assert!(session.refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_restore_without_token_skips_api() {
        let (session, _) = context();
        let api = FakeAccountApi {
            current: Some(user("admin")),
            ..Default::default()
        };
        let service = AuthService::new(Arc::new(api), session);

        assert!(service.restore().await.is_none());
    }
}
