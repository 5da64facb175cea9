/// What the provider reports in place of an identifier while the subscriber
/// still has to click the confirmation link.
pub const PENDING_CONFIRMATION: &str = "pending confirmation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    PendingConfirmation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionHandle {
    Confirmed(String),
    PendingConfirmation,
}

impl SubscriptionHandle {
    pub fn from_provider(subscription_arn: Option<String>) -> Self {
        match subscription_arn {
            Some(arn) if !arn.trim().is_empty() && arn != PENDING_CONFIRMATION => {
                Self::Confirmed(arn)
            }
            _ => Self::PendingConfirmation,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        match self {
            Self::Confirmed(_) => SubscriptionState::Active,
            Self::PendingConfirmation => SubscriptionState::PendingConfirmation,
        }
    }

}

// Handles travel through callers as plain strings, `None` and blanks included.
impl From<Option<&str>> for SubscriptionHandle {
    fn from(value: Option<&str>) -> Self {
        Self::from_provider(value.map(str::to_string))
    }
}

impl AsRef<str> for SubscriptionHandle {
    fn as_ref(&self) -> &str {
        match self {
            Self::Confirmed(arn) => arn,
            Self::PendingConfirmation => PENDING_CONFIRMATION,
        }
    }
}

impl std::fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
