use crate::utils::is_empty_or_whitespace;

const DEFAULT_CATEGORY: &str = "general";

/// Label attached to a broadcast so subscribers can filter on it,
/// e.g. "trade", "alert", "test" or "general".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCategory(String);

impl MessageCategory {
    pub fn parse(s: String) -> Result<MessageCategory, String> {
        if is_empty_or_whitespace(&s) {
            Err(String::from("A message category cannot be blank."))
        } else {
            Ok(Self(s.trim().to_string()))
        }
    }
}

impl Default for MessageCategory {
    fn default() -> Self {
        Self(DEFAULT_CATEGORY.to_string())
    }
}

impl AsRef<str> for MessageCategory {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct BroadcastMessage {
    pub body: String,
    pub subject: String,
    pub category: MessageCategory,
}

impl BroadcastMessage {
    pub fn new(body: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            subject: subject.into(),
            category: MessageCategory::default(),
        }
    }

    pub fn with_category(mut self, category: MessageCategory) -> Self {
        self.category = category;
        self
    }
}
