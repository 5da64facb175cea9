pub mod credentials;
pub mod signing;
pub mod sns_client;

pub use credentials::{MissingCredentials, ProviderCredentials};
pub use sns_client::{ProviderError, SnsClient, SnsError};
