use narvik::infrastructure::observability::TracingConfig;

#[test]
fn given_default_config_when_created_then_plain_text_logging() {
    let config = TracingConfig::default();
    assert!(!config.json_format);
}

#[test]
fn given_default_config_when_created_then_environment_is_set() {
    let config = TracingConfig::default();
    assert!(!config.environment.is_empty());
}

#[test]
fn given_default_config_when_created_then_level_is_info() {
    let config = TracingConfig::default();
    assert_eq!(config.level, "info");
}
