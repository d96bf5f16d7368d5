//! HTTP client for network-based API calls

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::models::{
    CourseCreate, CourseOutline, CourseUpdate, LessonCreate, LessonUpdate, ModuleCreate,
    ReorderEntry, ReorderRequest,
};
use shared::{ActionResponse, ApiResponse};

use crate::structure::ReorderGateway;
use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for making network requests to the course server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach the bearer token, if any
    fn identify(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.identify(self.client.get(self.url(path)));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.identify(self.client.post(self.url(path)).json(body));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.identify(self.client.put(self.url(path)).json(body));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.identify(self.client.delete(self.url(path)));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            // 优先解析服务端错误信封
            if let Ok(action) = serde_json::from_str::<ActionResponse>(&text)
                && let Some(kind) = action.kind
            {
                return Err(ClientError::Action {
                    kind,
                    message: action.message,
                });
            }
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
                _ => Err(ClientError::Internal(text)),
            };
        }

        response.json().await.map_err(Into::into)
    }

    /// Unwrap a mutation envelope, turning `status: error` into an error
    fn expect_success(action: ActionResponse) -> ClientResult<ActionResponse> {
        if action.is_success() {
            return Ok(action);
        }
        Err(ClientError::action(
            action.kind.unwrap_or(shared::ErrorKind::StorageFailure),
            action.message,
        ))
    }

    // ========== Course structure API ==========

    /// Load the full course structure
    pub async fn outline(&self, course_id: &str) -> ClientResult<CourseOutline> {
        let response: ApiResponse<CourseOutline> = self
            .get(&format!("/api/courses/{course_id}/structure"))
            .await?;
        response
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing course structure".to_string()))
    }

    /// Create a course owned by the caller; the new id is in `ActionResponse::id`
    pub async fn create_course(&self, payload: &CourseCreate) -> ClientResult<ActionResponse> {
        Self::expect_success(self.post("/api/courses", payload).await?)
    }

    pub async fn update_course(
        &self,
        course_id: &str,
        payload: &CourseUpdate,
    ) -> ClientResult<ActionResponse> {
        Self::expect_success(self.put(&format!("/api/courses/{course_id}"), payload).await?)
    }

    pub async fn create_module(
        &self,
        course_id: &str,
        payload: &ModuleCreate,
    ) -> ClientResult<ActionResponse> {
        Self::expect_success(
            self.post(&format!("/api/courses/{course_id}/modules"), payload)
                .await?,
        )
    }

    pub async fn delete_module(
        &self,
        course_id: &str,
        module_id: &str,
    ) -> ClientResult<ActionResponse> {
        Self::expect_success(
            self.delete(&format!("/api/courses/{course_id}/modules/{module_id}"))
                .await?,
        )
    }

    pub async fn create_lesson(
        &self,
        course_id: &str,
        module_id: &str,
        payload: &LessonCreate,
    ) -> ClientResult<ActionResponse> {
        Self::expect_success(
            self.post(
                &format!("/api/courses/{course_id}/modules/{module_id}/lessons"),
                payload,
            )
            .await?,
        )
    }

    /// Edit lesson content; ordering is not affected
    pub async fn update_lesson(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
        payload: &LessonUpdate,
    ) -> ClientResult<ActionResponse> {
        Self::expect_success(
            self.put(
                &format!("/api/courses/{course_id}/modules/{module_id}/lessons/{lesson_id}"),
                payload,
            )
            .await?,
        )
    }

    pub async fn delete_lesson(
        &self,
        course_id: &str,
        module_id: &str,
        lesson_id: &str,
    ) -> ClientResult<ActionResponse> {
        Self::expect_success(
            self.delete(&format!(
                "/api/courses/{course_id}/modules/{module_id}/lessons/{lesson_id}"
            ))
            .await?,
        )
    }
}

#[async_trait]
impl ReorderGateway for HttpClient {
    async fn reorder_modules(
        &self,
        course_id: &str,
        entries: &[ReorderEntry],
        expected_version: Option<u64>,
    ) -> ClientResult<ActionResponse> {
        let request = ReorderRequest {
            entries: entries.to_vec(),
            expected_version,
        };
        Self::expect_success(
            self.put(&format!("/api/courses/{course_id}/modules/order"), &request)
                .await?,
        )
    }

    async fn reorder_lessons(
        &self,
        module_id: &str,
        entries: &[ReorderEntry],
        course_id: &str,
        expected_version: Option<u64>,
    ) -> ClientResult<ActionResponse> {
        let request = ReorderRequest {
            entries: entries.to_vec(),
            expected_version,
        };
        Self::expect_success(
            self.put(
                &format!("/api/courses/{course_id}/modules/{module_id}/lessons/order"),
                &request,
            )
            .await?,
        )
    }
}
