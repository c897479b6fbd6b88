mod credentials;
mod google_client;
mod google_types;

pub use credentials::Credentials;
pub use google_client::GoogleSpeechClient;
