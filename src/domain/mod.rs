mod broadcast_message;
mod subscriber_email;
mod subscription_handle;

pub use broadcast_message::{BroadcastMessage, MessageCategory};
pub use subscriber_email::{SubscriberEmail, is_valid_email};
pub use subscription_handle::{PENDING_CONFIRMATION, SubscriptionHandle, SubscriptionState};
