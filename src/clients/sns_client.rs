use crate::clients::ProviderCredentials;
use crate::clients::signing::{SigningError, sign_form_post};
use crate::utils::error_chain_fmt;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const API_VERSION: &str = "2010-03-31";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";
const REQUEST_ID_HEADER: &str = "x-amzn-RequestId";
const SERVICE: &str = "sns";

/// Typed client over the pub/sub provider's query API.
///
/// Cheap to build: the underlying `reqwest::Client` is a connection pool shared
/// with whoever handed it over.
pub struct SnsClient {
    credentials: ProviderCredentials,
    endpoint: String,
    http_client: Client,
    timeout: std::time::Duration,
}

impl SnsClient {
    pub fn new(
        http_client: Client,
        endpoint: String,
        credentials: ProviderCredentials,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            credentials,
            endpoint,
            http_client,
            timeout,
        }
    }

    /// Returns the subscription identifier, or `None` when the provider is
    /// still waiting on the endpoint owner to confirm.
    #[tracing::instrument(name = "Provider subscribe request", skip(self, endpoint, attributes))]
    pub async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
        attributes: &[(String, String)],
    ) -> Result<Option<String>, SnsError> {
        let mut params = vec![
            param("Action", "Subscribe"),
            param("TopicArn", topic_arn),
            param("Protocol", protocol),
            param("Endpoint", endpoint),
        ];
        for (index, (key, value)) in attributes.iter().enumerate() {
            let n = index + 1;
            params.push(param(&format!("Attributes.entry.{n}.key"), key));
            params.push(param(&format!("Attributes.entry.{n}.value"), value));
        }

        let response: SubscribeEnvelope = decode(&self.send(params).await?)?;

        Ok(response.subscribe_response.subscribe_result.subscription_arn)
    }

    #[tracing::instrument(name = "Provider unsubscribe request", skip(self))]
    pub async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), SnsError> {
        let params = vec![
            param("Action", "Unsubscribe"),
            param("SubscriptionArn", subscription_arn),
        ];
        self.send(params).await?;

        Ok(())
    }

    /// Every message attribute is sent as a `String` data type.
    #[tracing::instrument(
        name = "Provider publish request",
        skip(self, message, message_attributes)
    )]
    pub async fn publish(
        &self,
        topic_arn: &str,
        message: &str,
        subject: &str,
        message_attributes: &[(String, String)],
    ) -> Result<String, SnsError> {
        let mut params = vec![
            param("Action", "Publish"),
            param("TopicArn", topic_arn),
            param("Message", message),
        ];
        if !subject.trim().is_empty() {
            params.push(param("Subject", subject));
        }
        for (index, (name, value)) in message_attributes.iter().enumerate() {
            let n = index + 1;
            params.push(param(&format!("MessageAttributes.entry.{n}.Name"), name));
            params.push(param(
                &format!("MessageAttributes.entry.{n}.Value.DataType"),
                "String",
            ));
            params.push(param(
                &format!("MessageAttributes.entry.{n}.Value.StringValue"),
                value,
            ));
        }

        let response: PublishEnvelope = decode(&self.send(params).await?)?;

        Ok(response.publish_response.publish_result.message_id)
    }

    async fn send(&self, mut params: Vec<(String, String)>) -> Result<String, SnsError> {
        params.push(param("Version", API_VERSION));
        let body = serde_urlencoded::to_string(&params)?;
        let host = self.host()?;
        let signed = sign_form_post(
            &self.credentials,
            SERVICE,
            &host,
            FORM_CONTENT_TYPE,
            &body,
            Utc::now(),
        )?;

        let mut request = self
            .http_client
            .post(format!("{}/", self.endpoint))
            .timeout(self.timeout)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .header("X-Amz-Date", signed.amz_date)
            .header(AUTHORIZATION, signed.authorization);
        if let Some(token) = signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let response = request.body(body).send().await.map_err(SnsError::Transport)?;
        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let text = response.text().await.map_err(SnsError::Transport)?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(SnsError::Provider(ProviderError::from_response(
                status.as_u16(),
                request_id,
                &text,
            )))
        }
    }

    fn host(&self) -> Result<String, SnsError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|_| SnsError::InvalidEndpoint(self.endpoint.clone()))?;
        let host = url
            .host_str()
            .ok_or_else(|| SnsError::InvalidEndpoint(self.endpoint.clone()))?;

        Ok(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }
}

fn param(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, SnsError> {
    serde_json::from_str(text).map_err(SnsError::UnexpectedResponse)
}

/// Diagnostics the provider attaches to a rejected request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<String>,
    pub status: u16,
    pub request_id: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn from_response(status: u16, request_id: Option<String>, body: &str) -> Self {
        let envelope = serde_json::from_str::<ErrorEnvelope>(body).unwrap_or_default();
        let (code, message) = match envelope.error {
            Some(error) => (error.code, error.message),
            None => (None, None),
        };

        Self {
            code,
            status,
            request_id: envelope.request_id.or(request_id),
            message: message
                .unwrap_or_else(|| format!("The provider responded with status {}.", status)),
        }
    }
}

#[derive(thiserror::Error)]
pub enum SnsError {
    #[error("The notification provider rejected the request.")]
    Provider(#[source] ProviderError),
    #[error("Failed to reach the notification provider.")]
    Transport(#[source] reqwest::Error),
    #[error("The notification provider returned an unexpected response.")]
    UnexpectedResponse(#[source] serde_json::Error),
    #[error("{0} is not a valid notification provider endpoint.")]
    InvalidEndpoint(String),
    #[error("Failed to encode the notification provider request.")]
    Encoding(#[from] serde_urlencoded::ser::Error),
    #[error("Failed to sign the notification provider request.")]
    Signing(#[from] SigningError),
}

impl SnsError {
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            SnsError::Provider(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Debug for SnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Deserialize, Debug, Default)]
struct ErrorEnvelope {
    #[serde(rename = "Error")]
    error: Option<ErrorBody>,
    #[serde(rename = "RequestId")]
    request_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SubscribeEnvelope {
    subscribe_response: SubscribeResponse,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SubscribeResponse {
    subscribe_result: SubscribeResult,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SubscribeResult {
    #[serde(default)]
    subscription_arn: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PublishEnvelope {
    publish_response: PublishResponse,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PublishResponse {
    publish_result: PublishResult,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PublishResult {
    message_id: String,
}
