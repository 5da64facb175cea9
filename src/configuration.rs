use anyhow::Context;
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::{Path, PathBuf};

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub notifications: NotificationSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct NotificationSettings {
    pub topic_arn: String,
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<Secret<String>>,
    #[serde(default)]
    pub session_token: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    // Only attached to new subscriptions when a deployment asks for it.
    #[serde(default)]
    pub filter_policy_categories: Option<Vec<String>>,
}

impl NotificationSettings {
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://sns.{}.amazonaws.com", self.region),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Where the dispatcher looks up its settings before every operation.
pub trait SettingsSource: Send + Sync {
    fn notification_settings(&self) -> Result<NotificationSettings, anyhow::Error>;
}

impl SettingsSource for NotificationSettings {
    fn notification_settings(&self) -> Result<NotificationSettings, anyhow::Error> {
        Ok(self.clone())
    }
}

/// Re-reads the configuration files and the environment on each call, so an
/// updated topic or credential is picked up by the next operation.
pub struct LayeredSettings {
    base_path: PathBuf,
}

impl LayeredSettings {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_current_dir() -> Result<Self, std::io::Error> {
        let base_path = std::env::current_dir()?.join("configuration");

        Ok(Self::new(base_path))
    }
}

impl SettingsSource for LayeredSettings {
    fn notification_settings(&self) -> Result<NotificationSettings, anyhow::Error> {
        let settings = load_configuration(&self.base_path)
            .context("Failed to read notification settings.")?;

        Ok(settings.notifications)
    }
}

pub fn load_configuration(configuration_directory: &Path) -> Result<Settings, config::ConfigError> {
    // Detect the running environment.
    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|e: String| config::ConfigError::Message(e))?;
    let environment_filename = format!("{}.yaml", environment.as_str());
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_NOTIFICATIONS__TOPIC_ARN=arn:...` would set `Settings.notifications.topic_arn`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("notifications.filter_policy_categories")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
