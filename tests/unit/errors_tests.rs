/*!
 * Tests for the error types
 */

use promptlens::errors::{AppError, BridgeError, ConfigError, ProviderError, TaskError};

#[test]
fn test_providerError_display_shouldIncludeDetails() {
    let error = ProviderError::ApiError {
        status_code: 401,
        message: "invalid x-api-key".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 401 - invalid x-api-key");

    let error = ProviderError::StreamError("connection reset".to_string());
    assert_eq!(error.to_string(), "Stream error: connection reset");
}

#[test]
fn test_taskError_emptyText_shouldUseUserFacingMessage() {
    assert_eq!(TaskError::EmptyText.to_string(), "No text provided");
}

#[test]
fn test_configError_display_shouldNameProvider() {
    let error = ConfigError::MissingApiKey("Anthropic".to_string());
    assert_eq!(error.to_string(), "API key is required for the Anthropic provider");
}

#[test]
fn test_appError_fromConversions_shouldWrapSources() {
    let app: AppError = ProviderError::RequestFailed("timeout".to_string()).into();
    assert!(matches!(app, AppError::Provider(_)));
    assert_eq!(app.to_string(), "Provider error: API request failed: timeout");

    let app: AppError = TaskError::EmptyText.into();
    assert!(matches!(app, AppError::Task(TaskError::EmptyText)));

    let app: AppError = BridgeError::RelayFailed("gone".to_string()).into();
    assert_eq!(app.to_string(), "Bridge error: Relay failed: gone");

    let app: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "conf.json").into();
    assert!(matches!(app, AppError::File(_)));

    let app: AppError = anyhow::anyhow!("something else").into();
    assert_eq!(app.to_string(), "Unknown error: something else");
}

#[test]
fn test_configError_intoAnyhow_shouldKeepMessage() {
    let result: anyhow::Result<()> = Err(ConfigError::InvalidLanguage("zz".to_string()).into());
    assert_eq!(result.unwrap_err().to_string(), "Invalid target language: zz");
}
