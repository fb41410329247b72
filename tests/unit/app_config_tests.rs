/*!
 * Tests for configuration loading and overrides
 */

use anyhow::Result;
use narrato::app_config::{
    Config, DEEPGRAM_API_KEY_VAR, GenerativeProvider, LogLevel, OPENAI_API_KEY_VAR, SpeechProvider,
};
use crate::common;

#[test]
fn test_config_roundTripThroughFile_shouldPreserveSettings() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let mut config = Config::offline();
    config.audience = "Technical".to_string();
    config.pipeline.max_segments = 8;
    config.rate_limit.window_secs = 30;
    std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;

    let loaded: Config = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

    assert_eq!(loaded.audience, "Technical");
    assert_eq!(loaded.pipeline.max_segments, 8);
    assert_eq!(loaded.rate_limit.window_secs, 30);
    assert_eq!(loaded.generation.provider, GenerativeProvider::None);
    assert_eq!(loaded.speech.provider, SpeechProvider::Silent);
    Ok(())
}

#[test]
fn test_config_deserialize_withLowercaseEnums_shouldParse() -> Result<()> {
    let json = r#"{
        "generation": { "provider": "ollama" },
        "speech": { "provider": "silent" },
        "log_level": "debug"
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.generation.provider, GenerativeProvider::Ollama);
    assert_eq!(config.generation.get_endpoint(), "http://localhost:11434");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_config_applyOverrides_withOpenAiProvider_shouldSatisfyValidation() {
    let mut config = Config::default();
    config.generation.provider = GenerativeProvider::OpenAI;
    assert!(config.validate().is_err());

    config.apply_overrides(|name| match name {
        OPENAI_API_KEY_VAR => Some("sk-test".to_string()),
        DEEPGRAM_API_KEY_VAR => Some("dg-test".to_string()),
        _ => None,
    });

    assert_eq!(config.generation.get_api_key(), "sk-test");
    assert_eq!(config.speech.api_key, "dg-test");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_applyOverrides_withEmptyValue_shouldKeepKeyEmpty() {
    let mut config = Config::default();
    config.apply_overrides(|_| Some(String::new()));

    assert!(config.generation.get_api_key().is_empty());
    assert!(config.speech.api_key.is_empty());
}

#[test]
fn test_config_validate_withZeroConcurrency_shouldFail() {
    let mut config = Config::offline();
    config.pipeline.concurrent_segments = 0;

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("concurrent_segments"));
}
