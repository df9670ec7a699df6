use forge_core::{ForgeError, GenerateOptions};
use forge_model::{
    MockLlm, ModelDescriptor, ModelRegistry, ProviderFamily, ProviderSettings, ProvidersConfig,
};
use std::sync::Arc;

#[test]
fn unknown_model_fails_before_any_adapter_is_touched() {
    let mock = Arc::new(MockLlm::new("openai"));
    let registry = ModelRegistry::new().with_adapter(ProviderFamily::OpenAi, mock.clone());

    let err = registry.resolve("not-a-real-model").unwrap_err();
    assert!(matches!(err, ForgeError::UnknownModel(ref id) if id == "not-a-real-model"));
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn missing_credentials_only_disable_their_family() {
    let mut config = ProvidersConfig::default();
    config.anthropic = ProviderSettings::default().with_api_key("ak");
    let registry = ModelRegistry::from_config(&config);

    assert!(registry.is_available(ProviderFamily::Anthropic));
    assert!(!registry.is_available(ProviderFamily::OpenAi));
    assert!(!registry.is_available(ProviderFamily::Ollama));
    assert_eq!(registry.available_families(), vec![ProviderFamily::Anthropic]);
    assert_eq!(registry.default_model(), "claude-3-5-sonnet-latest");

    let resolved = registry.resolve("claude-3-5-haiku-latest").unwrap();
    assert_eq!(resolved.descriptor.family, ProviderFamily::Anthropic);

    match registry.resolve("gpt-4o").unwrap_err() {
        ForgeError::ProviderUnavailable { family, reason } => {
            assert_eq!(family, "openai");
            assert!(reason.contains("OPENAI_API_KEY"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn disabled_family_is_unavailable_even_with_a_key() {
    let mut config = ProvidersConfig::default();
    config.groq = ProviderSettings { enabled: false, ..ProviderSettings::default().with_api_key("g") };
    let registry = ModelRegistry::from_config(&config);
    assert!(!registry.is_available(ProviderFamily::Groq));
    assert!(registry.unavailable_reason(ProviderFamily::Groq).is_some());
}

#[test]
fn providers_config_reads_toml_tables() {
    let config: ProvidersConfig = toml::from_str(
        r#"
        [openai]
        api_key = "sk-1"

        [gemini]
        api_keys = ["g1", "g2"]
        base_url = "http://localhost:9000"

        [ollama]
        base_url = "http://localhost:11434"
        timeout_secs = 600
        "#,
    )
    .unwrap();
    assert_eq!(config.openai.keys(), vec!["sk-1".to_string()]);
    assert_eq!(config.gemini.keys().len(), 2);
    assert!(config.xai.enabled);
    assert_eq!(config.ollama.timeout_secs, Some(600));
    assert_eq!(config.openai.timeout_secs, None);

    let registry = ModelRegistry::from_config(&config);
    assert!(registry.is_available(ProviderFamily::Ollama));
    assert!(registry.is_available(ProviderFamily::Gemini));
}

#[tokio::test]
async fn resolve_or_default_uses_the_configured_default() {
    let mock = Arc::new(MockLlm::new("ollama").with_response("pong"));
    let registry = ModelRegistry::new()
        .with_descriptor(ModelDescriptor::new("local-test", ProviderFamily::Ollama, true))
        .with_adapter(ProviderFamily::Ollama, mock.clone())
        .with_default_model("local-test");

    let resolved = registry.resolve_or_default(None).unwrap();
    let reply = resolved
        .adapter
        .generate("ping", &resolved.descriptor.id, &GenerateOptions::new())
        .await
        .unwrap();
    assert_eq!(reply.content, "pong");
    assert_eq!(mock.calls()[0].model, "local-test");
}

#[test]
fn non_streaming_models_are_flagged() {
    let registry = ModelRegistry::new();
    assert!(!registry.descriptor("o1").unwrap().supports_streaming);
    assert!(registry.descriptors().count() >= ProviderFamily::ALL.len());
}
