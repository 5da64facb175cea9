use secrecy::Secret;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use trade_notifications::configuration::{NotificationSettings, SettingsSource};
use trade_notifications::notification_dispatcher::NotificationDispatcher;
use trade_notifications::telemetry::{get_subscriber, init_subscriber};
use wiremock::{MockServer, Request, ResponseTemplate};

pub const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:trade-notifications";

// Ensure that the `tracing` stack is only initialised once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

/// Settings the tests can edit, or break, between two dispatcher calls.
pub struct SharedSettings {
    settings: Mutex<NotificationSettings>,
    unreadable: AtomicBool,
}

impl SharedSettings {
    pub fn update(&self, change: impl FnOnce(&mut NotificationSettings)) {
        change(&mut self.settings.lock().unwrap());
    }

    /// Every later read fails, as a malformed configuration file would.
    pub fn make_unreadable(&self) {
        self.unreadable.store(true, Ordering::SeqCst);
    }
}

impl SettingsSource for SharedSettings {
    fn notification_settings(&self) -> Result<NotificationSettings, anyhow::Error> {
        if self.unreadable.load(Ordering::SeqCst) {
            anyhow::bail!("Failed to read the notification settings.");
        }
        let settings = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("Settings lock was poisoned."))?;

        Ok(settings.clone())
    }
}

pub struct TestDispatcher {
    pub dispatcher: NotificationDispatcher,
    pub provider_server: MockServer,
    pub settings: Arc<SharedSettings>,
}

impl TestDispatcher {
    /// Form parameters of every request the provider double received.
    pub async fn received_form_requests(&self) -> Vec<Vec<(String, String)>> {
        self.provider_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(form_params)
            .collect()
    }
}

pub async fn spawn_dispatcher() -> TestDispatcher {
    LazyLock::force(&TRACING);

    let provider_server = MockServer::start().await;
    let settings = Arc::new(SharedSettings {
        settings: Mutex::new(NotificationSettings {
            topic_arn: TOPIC_ARN.to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some(provider_server.uri()),
            access_key: Some("AKIDTEST".to_string()),
            secret_key: Some(Secret::new("test-secret".to_string())),
            session_token: None,
            timeout_milliseconds: 2000,
            filter_policy_categories: None,
        }),
        unreadable: AtomicBool::new(false),
    });
    let dispatcher = NotificationDispatcher::new(settings.clone());

    TestDispatcher {
        dispatcher,
        provider_server,
        settings,
    }
}

pub fn form_params(request: &Request) -> Vec<(String, String)> {
    serde_urlencoded::from_bytes(&request.body).unwrap()
}

pub fn form_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Matches requests whose form body carries `key=value`.
pub struct FormParam(pub &'static str, pub &'static str);

impl wiremock::Match for FormParam {
    fn matches(&self, request: &Request) -> bool {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(&request.body) {
            Ok(params) => form_value(&params, self.0) == Some(self.1),
            Err(_) => false,
        }
    }
}

pub fn subscribe_response(subscription_arn: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "SubscribeResponse": {
            "SubscribeResult": { "SubscriptionArn": subscription_arn },
            "ResponseMetadata": { "RequestId": "subscribe-request" }
        }
    }))
}

pub fn publish_response(message_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "PublishResponse": {
            "PublishResult": { "MessageId": message_id },
            "ResponseMetadata": { "RequestId": "publish-request" }
        }
    }))
}

pub fn unsubscribe_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "UnsubscribeResponse": {
            "ResponseMetadata": { "RequestId": "unsubscribe-request" }
        }
    }))
}

pub fn error_response(status: u16, code: &str, request_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "Error": {
            "Type": "Sender",
            "Code": code,
            "Message": format!("{code} raised by the provider")
        },
        "RequestId": request_id
    }))
}
