mod health;
mod languages;
mod service_info;
mod transcribe;

pub use health::health_handler;
pub use languages::languages_handler;
pub use service_info::service_info_handler;
pub use transcribe::transcribe_handler;
