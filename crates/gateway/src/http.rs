//! REST client for the Inbox API.
//!
//! Wraps the Inbox HTTP endpoints using [`reqwest`]. Non-2xx responses are
//! normalized through [`ActionError::from_response`].

use std::time::Duration;

use async_trait::async_trait;
use faqdesk_core::inbox::InboxItem;
use faqdesk_core::manual_faq::ManualFaqPayload;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::InboxApi;
use crate::error::ActionError;
use crate::payload::{
    ApproveRequest, ApproveResponse, AttachSourceRequest, BulkApproveRequest, BulkRejectRequest,
    BulkResponse, ConvertToFaqRequest, ConvertToFaqResponse, DismissRequest, ListPage, ListQuery,
    ManualFaqResponse, NoteRequest, PromoteRequest, PromoteResponse, RequestReviewRequest,
    RequestReviewResponse,
};

/// HTTP client for one Inbox API deployment.
pub struct HttpInboxApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpInboxApi {
    /// Create a client.
    ///
    /// * `base_url` - e.g. `https://kb.example.com/api/v1`.
    /// * `timeout` - per-request timeout; `None` leaves requests unbounded.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ActionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Self::with_client(client, base_url, token)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, ActionError> {
        let base_url = Url::parse(base_url).map_err(|e| ActionError::Failure {
            status: None,
            message: format!("Invalid Inbox API URL '{base_url}': {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ActionError::Failure {
                status: None,
                message: format!("Inbox API URL '{base_url}' cannot be a base URL"),
            });
        }
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ---- private helpers ----

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.endpoint(segments));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ActionError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, segments).json(body).send().await?;
        Self::parse_response(response).await
    }

    async fn post_unit<B>(&self, segments: &[&str], body: &B) -> Result<(), ActionError>
    where
        B: Serialize + Sync,
    {
        let response = self.request(Method::POST, segments).json(body).send().await?;
        Self::check_status(response).await
    }

    /// Ensure the response has a success status code, or normalize the
    /// error body.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ActionError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ActionError::from_response(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), error = %err, "Inbox API returned an error");
            return Err(err);
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ActionError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ActionError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl InboxApi for HttpInboxApi {
    /// `GET /inbox?status=..&cursor=..`
    async fn list(&self, query: &ListQuery) -> Result<ListPage, ActionError> {
        let response = self
            .request(Method::GET, &["inbox"])
            .query(&query.to_params())
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `GET /inbox/{id}`
    async fn get(&self, id: &str) -> Result<InboxItem, ActionError> {
        let response = self.request(Method::GET, &["inbox", id]).send().await?;
        Self::parse_response(response).await
    }

    async fn attach_source(
        &self,
        id: &str,
        body: &AttachSourceRequest,
    ) -> Result<InboxItem, ActionError> {
        self.post_json(&["inbox", id, "attach-source"], body).await
    }

    async fn approve(
        &self,
        id: &str,
        body: &ApproveRequest,
    ) -> Result<ApproveResponse, ActionError> {
        self.post_json(&["inbox", id, "approve"], body).await
    }

    async fn promote(
        &self,
        id: &str,
        body: &PromoteRequest,
    ) -> Result<PromoteResponse, ActionError> {
        self.post_json(&["inbox", id, "promote"], body).await
    }

    async fn convert_to_faq(
        &self,
        id: &str,
        body: &ConvertToFaqRequest,
    ) -> Result<ConvertToFaqResponse, ActionError> {
        self.post_json(&["inbox", id, "convert-to-faq"], body).await
    }

    async fn reject(&self, id: &str, body: &NoteRequest) -> Result<(), ActionError> {
        self.post_unit(&["inbox", id, "reject"], body).await
    }

    async fn mark_reviewed(&self, id: &str, body: &NoteRequest) -> Result<(), ActionError> {
        self.post_unit(&["inbox", id, "mark-reviewed"], body).await
    }

    async fn dismiss(&self, id: &str, body: &DismissRequest) -> Result<(), ActionError> {
        self.post_unit(&["inbox", id, "dismiss"], body).await
    }

    async fn request_review(
        &self,
        id: &str,
        body: &RequestReviewRequest,
    ) -> Result<RequestReviewResponse, ActionError> {
        self.post_json(&["inbox", id, "request-review"], body).await
    }

    async fn bulk_approve(&self, body: &BulkApproveRequest) -> Result<BulkResponse, ActionError> {
        self.post_json(&["inbox", "bulk-approve"], body).await
    }

    async fn bulk_reject(&self, body: &BulkRejectRequest) -> Result<BulkResponse, ActionError> {
        self.post_json(&["inbox", "bulk-reject"], body).await
    }

    async fn create_manual_faq(
        &self,
        body: &ManualFaqPayload,
    ) -> Result<ManualFaqResponse, ActionError> {
        self.post_json(&["faq", "manual"], body).await
    }
}
