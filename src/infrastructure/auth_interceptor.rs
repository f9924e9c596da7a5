// Authorization interceptor - attaches the bearer token and handles 401
use crate::error::{ApiError, ApiResult};
use crate::infrastructure::session_store::SessionContext;
use reqwest::{RequestBuilder, Response, StatusCode};

#[derive(Clone)]
pub struct AuthInterceptor {
    session: SessionContext,
}

impl AuthInterceptor {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send an authorized request and classify the status.
    ///
    /// A 401 from any endpoint expires the whole session (tokens purged,
    /// navigation to sign-in) before the caller sees `SessionExpired`.
    pub async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = self.authorize(request).send().await?;
        self.inspect(response)
    }

    fn inspect(&self, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("API answered 401 for {}", response.url().path());
            self.session.expire();
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response)
    }
}
