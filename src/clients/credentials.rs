use crate::configuration::NotificationSettings;
use crate::utils::is_empty_or_whitespace;
use secrecy::{ExposeSecret, Secret};

const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

#[derive(Clone, Debug)]
pub struct ProviderCredentials {
    pub access_key: String,
    pub secret_key: Secret<String>,
    pub session_token: Option<Secret<String>>,
    pub region: String,
}

#[derive(thiserror::Error, Debug)]
#[error("No provider credentials were configured or found in the environment.")]
pub struct MissingCredentials;

impl ProviderCredentials {
    /// Configured keys win. When either half of the key pair is missing we fall
    /// back to the credentials the execution environment exposes.
    pub fn resolve<F>(
        settings: &NotificationSettings,
        lookup: F,
    ) -> Result<Self, MissingCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = settings.region.clone();
        let access_key = settings
            .access_key
            .as_ref()
            .filter(|key| !is_empty_or_whitespace(key));
        let secret_key = settings
            .secret_key
            .as_ref()
            .filter(|key| !is_empty_or_whitespace(key.expose_secret()));

        if let (Some(access_key), Some(secret_key)) = (access_key, secret_key) {
            return Ok(Self {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                session_token: settings.session_token.clone(),
                region,
            });
        }

        let ambient = |key: &str| lookup(key).filter(|value| !is_empty_or_whitespace(value));
        match (ambient(ACCESS_KEY_VAR), ambient(SECRET_KEY_VAR)) {
            (Some(access_key), Some(secret_key)) => Ok(Self {
                access_key,
                secret_key: Secret::new(secret_key),
                session_token: ambient(SESSION_TOKEN_VAR).map(Secret::new),
                region,
            }),
            _ => Err(MissingCredentials),
        }
    }

    pub fn from_environment(settings: &NotificationSettings) -> Result<Self, MissingCredentials> {
        Self::resolve(settings, |key| std::env::var(key).ok())
    }
}
