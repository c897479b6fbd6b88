/// Configuration for tracing initialization.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub level: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            json_format: false,
            level: "info".to_string(),
        }
    }
}
