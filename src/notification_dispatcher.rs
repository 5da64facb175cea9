use crate::clients::{ProviderCredentials, ProviderError, SnsClient, SnsError};
use crate::configuration::{NotificationSettings, SettingsSource};
use crate::domain::{BroadcastMessage, MessageCategory, SubscriberEmail, SubscriptionHandle};
use crate::utils::error_chain_fmt;
use anyhow::Context;
use reqwest::Client;
use std::sync::Arc;

const EMAIL_PROTOCOL: &str = "email";
const CATEGORY_ATTRIBUTE: &str = "category";
const FILTER_POLICY_ATTRIBUTE: &str = "FilterPolicy";

/// Subscribes email addresses to the trade notification topic, broadcasts
/// messages to it and cancels subscriptions.
///
/// Settings and credentials are resolved again for every operation. The only
/// state shared between calls is the HTTP connection pool.
#[derive(Clone)]
pub struct NotificationDispatcher {
    http_client: Client,
    settings: Arc<dyn SettingsSource>,
}

impl NotificationDispatcher {
    pub fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            http_client: Client::new(),
            settings,
        }
    }

    #[tracing::instrument(
        name = "Subscribe email to notifications",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    pub async fn subscribe_email(&self, email: &str) -> Result<SubscriptionHandle, DispatchError> {
        const FAILURE: &str = "Failed to subscribe email to notifications.";

        let email =
            SubscriberEmail::parse(email.to_string()).map_err(DispatchError::InvalidArgument)?;
        let (settings, sns_client) = self
            .topic_client()
            .map_err(|e| DispatchError::unexpected(FAILURE, e))?;
        let attributes = filter_policy_attributes(&settings);

        let subscription_arn = sns_client
            .subscribe(&settings.topic_arn, EMAIL_PROTOCOL, email.as_ref(), &attributes)
            .await
            .map_err(|e| DispatchError::provider(FAILURE, e))?;
        let handle = SubscriptionHandle::from_provider(subscription_arn);
        tracing::info!(subscription = %handle, "Email subscribed to notifications.");

        Ok(handle)
    }

    /// Best effort: failures are logged and never reach the caller.
    #[tracing::instrument(name = "Unsubscribe from notifications", skip(self))]
    pub async fn unsubscribe(&self, subscription_id: Option<&str>) {
        let handle = SubscriptionHandle::from(subscription_id);
        let SubscriptionHandle::Confirmed(subscription_arn) = handle else {
            tracing::info!("No confirmed subscription to cancel.");
            return;
        };

        let sns_client = match self.provider_client() {
            Ok((_, sns_client)) => sns_client,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    "Failed to unsubscribe from notifications."
                );
                return;
            }
        };

        match sns_client.unsubscribe(&subscription_arn).await {
            Ok(()) => tracing::info!("Subscription cancelled."),
            Err(e) => log_provider_failure("Failed to unsubscribe from notifications.", &e),
        }
    }

    /// Broadcasts to every confirmed subscriber. `category` defaults to "general".
    pub async fn publish(
        &self,
        body: &str,
        subject: &str,
        category: Option<&str>,
    ) -> Result<String, DispatchError> {
        let category = match category {
            Some(category) => MessageCategory::parse(category.to_string())
                .map_err(DispatchError::InvalidArgument)?,
            None => MessageCategory::default(),
        };

        self.publish_message(BroadcastMessage::new(body, subject).with_category(category))
            .await
    }

    #[tracing::instrument(
        name = "Publish broadcast message",
        skip(self, message),
        fields(subject = %message.subject, category = %message.category.as_ref())
    )]
    pub async fn publish_message(
        &self,
        message: BroadcastMessage,
    ) -> Result<String, DispatchError> {
        const FAILURE: &str = "Failed to publish broadcast message.";

        let (settings, sns_client) = self
            .topic_client()
            .map_err(|e| DispatchError::unexpected(FAILURE, e))?;
        let attributes = vec![(
            CATEGORY_ATTRIBUTE.to_string(),
            message.category.as_ref().to_string(),
        )];

        let message_id = sns_client
            .publish(&settings.topic_arn, &message.body, &message.subject, &attributes)
            .await
            .map_err(|e| DispatchError::provider(FAILURE, e))?;
        tracing::info!(message_id = %message_id, "Broadcast message published.");

        Ok(message_id)
    }

    /// Unsubscribing addresses a subscription directly, so no topic is needed here.
    fn provider_client(&self) -> Result<(NotificationSettings, SnsClient), anyhow::Error> {
        let settings = self.settings.notification_settings()?;
        let credentials = ProviderCredentials::from_environment(&settings)
            .context("Failed to resolve notification provider credentials.")?;
        let sns_client = SnsClient::new(
            self.http_client.clone(),
            settings.endpoint(),
            credentials,
            settings.timeout(),
        );

        Ok((settings, sns_client))
    }

    fn topic_client(&self) -> Result<(NotificationSettings, SnsClient), anyhow::Error> {
        let (settings, sns_client) = self.provider_client()?;
        if settings.topic_arn.trim().is_empty() {
            anyhow::bail!("No notification topic is configured.");
        }

        Ok((settings, sns_client))
    }
}

fn filter_policy_attributes(settings: &NotificationSettings) -> Vec<(String, String)> {
    match &settings.filter_policy_categories {
        Some(categories) if !categories.is_empty() => {
            let policy = serde_json::json!({ CATEGORY_ATTRIBUTE: categories });
            vec![(FILTER_POLICY_ATTRIBUTE.to_string(), policy.to_string())]
        }
        _ => vec![],
    }
}

fn log_provider_failure(message: &str, error: &SnsError) {
    match error.provider_error() {
        Some(details) => tracing::error!(
            error.code = details.code.as_deref(),
            error.status = details.status,
            error.request_id = details.request_id.as_deref(),
            error.message = %details.message,
            "{message}"
        ),
        None => tracing::error!(error.cause_chain = ?error, "{message}"),
    }
}

#[derive(thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{message}")]
    DispatchFailure {
        message: String,
        details: Option<ProviderError>,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    fn provider(message: &str, error: SnsError) -> Self {
        log_provider_failure(message, &error);

        DispatchError::DispatchFailure {
            message: message.to_string(),
            details: error.provider_error().cloned(),
            source: error.into(),
        }
    }

    fn unexpected(message: &str, error: anyhow::Error) -> Self {
        tracing::error!(error.cause_chain = ?error, "{message}");

        DispatchError::DispatchFailure {
            message: message.to_string(),
            details: None,
            source: error,
        }
    }

    /// Provider diagnostics, when the provider itself rejected the request.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            DispatchError::DispatchFailure { details, .. } => details.as_ref(),
            DispatchError::InvalidArgument(_) => None,
        }
    }
}

impl std::fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
