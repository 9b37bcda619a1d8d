//! Common utilities for the ARM client
//!
//! Authenticated request execution, ARM error mapping and long-running
//! operation handling shared by every resource provider.

pub mod paths;

use crate::auth::TokenProvider;
use crate::error::AzureError;
use crate::models::{
    ArmErrorResponse, LongRunning, LongRunningOperation, OperationBody, OperationState,
    OperationStatus,
};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Header carrying the operation status URL of a long-running request
pub const AZURE_ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";
/// Fallback header when ARM does not return `Azure-AsyncOperation`
pub const LOCATION_HEADER: &str = "Location";

/// HTTP client wrapper with bearer authentication against Resource Manager
pub struct HttpClient {
    client: Client,
    endpoint: String,
    tokens: TokenProvider,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, endpoint: &str, tokens: TokenProvider) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Resource Manager endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a full URL from an ARM path and api-version
    pub fn build_url(&self, path: &str, api_version: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}?api-version={}", self.endpoint, path, api_version)
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response, AzureError> {
        let token = self.tokens.token().await?;
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T, AzureError> {
        let url = self.build_url(path, api_version);
        let response = self.send::<()>(Method::GET, &url, None).await?;
        let response = check_status(response, "GET", path).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request without a body, as used by `listKeys` actions
    pub async fn post<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T, AzureError> {
        let url = self.build_url(path, api_version);
        let response = self.send::<()>(Method::POST, &url, None).await?;
        let response = check_status(response, "POST", path).await?;
        Ok(response.json().await?)
    }

    /// Make a PUT request that may start a long-running operation
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<LongRunning<T>, AzureError> {
        self.write(Method::PUT, path, api_version, body).await
    }

    /// Make a PATCH request that may start a long-running operation
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<LongRunning<T>, AzureError> {
        self.write(Method::PATCH, path, api_version, body).await
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<LongRunning<T>, AzureError> {
        let url = self.build_url(path, api_version);
        let method_name = method.as_str().to_string();
        let response = self.send(method, &url, Some(body)).await?;
        let response = check_status(response, &method_name, path).await?;

        let operation = polling_url(response.headers())
            .map(|polling_url| LongRunningOperation::new(method_name.clone(), polling_url));
        let text = response.text().await?;
        let resource = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text)?)
        };

        Ok(LongRunning { resource, operation })
    }

    /// Make a DELETE request.
    ///
    /// A resource that is already gone counts as deleted. Returns the long-running
    /// operation when ARM accepted the delete asynchronously.
    pub async fn delete(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Option<LongRunningOperation>, AzureError> {
        let url = self.build_url(path, api_version);
        let response = self.send::<()>(Method::DELETE, &url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("DELETE {}: already gone", path);
            return Ok(None);
        }
        let response = check_status(response, "DELETE", path).await?;
        Ok(polling_url(response.headers()).map(|url| LongRunningOperation::new("DELETE", url)))
    }

    /// Poll a long-running operation.
    ///
    /// A JSON `status` field wins when present; otherwise `202` means in progress and
    /// any other success code means the operation succeeded. Other client errors are
    /// reported as a failed operation. An expired polling URL (404) is `NotFound`;
    /// throttling, server and auth errors are returned as errors so the caller retries
    /// the poll.
    pub async fn poll(&self, operation: &LongRunningOperation) -> Result<OperationState, AzureError> {
        let response = self
            .send::<()>(Method::GET, &operation.polling_url, None)
            .await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            return Err(error_from_response(response, "GET", &operation.polling_url).await);
        }

        let text = response.text().await.unwrap_or_default();
        let body: Option<OperationBody> = serde_json::from_str(&text).ok();

        if let Some(reported) = body.as_ref().and_then(|b| b.status.as_deref()) {
            let op_status = OperationStatus::parse(reported);
            let error_message = match op_status {
                OperationStatus::Failed | OperationStatus::Canceled => Some(
                    body.as_ref()
                        .and_then(|b| b.error.as_ref())
                        .map(|e| format_error(&e.code, &e.message))
                        .unwrap_or_else(|| format!("operation {}", reported)),
                ),
                _ => None,
            };
            return Ok(OperationState {
                status: op_status,
                error_message,
            });
        }

        Ok(match status {
            StatusCode::ACCEPTED => OperationState::in_progress(),
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => OperationState::succeeded(),
            _ => {
                let detail = serde_json::from_str::<ArmErrorResponse>(&text)
                    .map(|e| format_error(&e.error.code, &e.error.message))
                    .unwrap_or_else(|_| format!("{} - {}", status, text));
                OperationState::failed(detail)
            }
        })
    }
}

fn polling_url(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AZURE_ASYNC_OPERATION_HEADER)
        .or_else(|| headers.get(LOCATION_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn format_error(code: &str, message: &str) -> String {
    if code.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", code, message)
    }
}

async fn check_status(response: Response, method: &str, path: &str) -> Result<Response, AzureError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response, method, path).await)
    }
}

/// Map a failed ARM response to an [`AzureError`]
async fn error_from_response(response: Response, method: &str, path: &str) -> AzureError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::NOT_FOUND {
        return AzureError::NotFound(format!("{} {}: {}", method, path, body));
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AzureError::Authentication(format!("{} {} returned {}: {}", method, path, status, body));
    }

    match serde_json::from_str::<ArmErrorResponse>(&body) {
        Ok(parsed) if !parsed.error.code.is_empty() || !parsed.error.message.is_empty() => {
            AzureError::Api {
                status: status.as_u16(),
                code: parsed.error.code,
                message: parsed.error.message,
            }
        }
        _ => AzureError::Api {
            status: status.as_u16(),
            code: String::new(),
            message: format!("{} {} failed: {}", method, path, body),
        },
    }
}
