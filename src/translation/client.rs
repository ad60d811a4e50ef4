/*!
 * Translation client with fallback-to-source failure policy.
 *
 * Every call goes through the rate limiter first. When the provider call
 * fails for any reason the client does not propagate the error: it logs
 * the failure, imposes the longer cooldown, and hands back the original
 * text. A single transient failure must not abort a multi-hour batch job;
 * degraded (untranslated) content beats missing content.
 */

use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::app_config::{TranslationCommonConfig, TranslationConfig, TranslationProvider as ConfigProvider};
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::mock::{MockProvider, MockRequest};
use crate::providers::ollama::{Ollama, GenerationRequest};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::rate_limiter::RateLimiter;

/// Result of a single translation call.
///
/// Callers can distinguish "translated" from "fell back to source text"
/// without exception-style control flow; neither variant is an error.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    /// The service produced a translation
    Translated(String),
    /// The call failed; the original text is returned instead
    Fallback {
        /// The original, untranslated text
        text: String,
        /// Why the service call failed
        reason: String,
    },
}

impl TranslationOutcome {
    /// The text to place into the output, translated or not
    pub fn into_text(self) -> String {
        match self {
            Self::Translated(text) => text,
            Self::Fallback { text, .. } => text,
        }
    }

    /// Whether this outcome fell back to the source text
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Snapshot of translation counters for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TranslationStats {
    /// Strings successfully translated
    pub translated: u64,
    /// Strings that fell back to source text
    pub fallbacks: u64,
}

/// Translation provider implementation variants
enum ProviderImpl {
    /// Ollama LLM service
    Ollama(Ollama),
    /// OpenAI API service
    OpenAI(OpenAI),
    /// Anthropic API service
    Anthropic(Anthropic),
    /// Deterministic in-process provider for tests
    Mock(MockProvider),
}

/// Rate-limited single-string translation client
pub struct TranslationClient {
    /// Provider implementation
    provider: ProviderImpl,
    /// Temporal gate in front of every service call
    limiter: RateLimiter,
    /// Common translation settings
    common: TranslationCommonConfig,
    /// Model name for the active provider
    model: String,
    /// Strings successfully translated
    translated: AtomicU64,
    /// Strings that fell back to source text
    fallbacks: AtomicU64,
    /// Fallbacks since the last success
    consecutive_failures: AtomicU64,
}

impl TranslationClient {
    /// Create a new translation client from the active provider configuration
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let common = config.common.clone();
        let timeout_secs = config
            .get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or(30);

        let provider = match config.provider {
            ConfigProvider::Ollama => ProviderImpl::Ollama(Ollama::new_with_config(
                config.get_endpoint(),
                timeout_secs,
                common.retry_count,
                common.retry_backoff_ms,
            )),
            ConfigProvider::OpenAI => ProviderImpl::OpenAI(OpenAI::new_with_config(
                config.get_api_key(),
                config.get_endpoint(),
                timeout_secs,
                common.retry_count,
                common.retry_backoff_ms,
            )),
            ConfigProvider::Anthropic => ProviderImpl::Anthropic(Anthropic::new_with_config(
                config.get_api_key(),
                config.get_endpoint(),
                timeout_secs,
                common.retry_count,
                common.retry_backoff_ms,
            )),
        };

        Ok(Self {
            provider,
            limiter: RateLimiter::from_millis(common.rate_limit_delay_ms, common.failure_cooldown_ms),
            model: config.get_model(),
            common,
            translated: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
        })
    }

    /// Create a client backed by a mock provider (for tests)
    pub fn with_mock(mock: MockProvider, common: TranslationCommonConfig) -> Self {
        Self {
            provider: ProviderImpl::Mock(mock),
            limiter: RateLimiter::from_millis(common.rate_limit_delay_ms, common.failure_cooldown_ms),
            model: "mock".to_string(),
            common,
            translated: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
        }
    }

    /// Current counter snapshot
    pub fn stats(&self) -> TranslationStats {
        TranslationStats {
            translated: self.translated.load(Ordering::SeqCst),
            fallbacks: self.fallbacks.load(Ordering::SeqCst),
        }
    }

    /// Fallbacks since the last successful translation
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Configured abort threshold for consecutive fallbacks (0 = never)
    pub fn max_consecutive_failures(&self) -> u64 {
        self.common.max_consecutive_failures
    }

    /// Test the connection to the configured provider
    pub async fn test_connection(&self) -> Result<()> {
        let result = match &self.provider {
            ProviderImpl::Ollama(client) => client.test_connection().await,
            ProviderImpl::OpenAI(client) => client.test_connection().await,
            ProviderImpl::Anthropic(client) => client.test_connection().await,
            ProviderImpl::Mock(client) => client.test_connection().await,
        };

        result.map_err(|e| anyhow!("Failed to connect to translation provider: {}", e))
    }

    /// Translate a single non-empty string.
    ///
    /// Always waits on the rate limiter before calling out. Never returns
    /// an error: a failed call produces `Fallback` with the original text
    /// after the post-failure cooldown has been served.
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> TranslationOutcome {
        self.limiter.wait().await;

        let system_prompt = self.build_system_prompt(source_language, target_language);
        let result = self
            .dispatch(text, &system_prompt, source_language, target_language)
            .await;

        match result {
            Ok(translated) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                let done = self.translated.fetch_add(1, Ordering::SeqCst) + 1;

                // Periodic breather so sustained runs stay under the radar
                if self.common.breather_every > 0 && done % self.common.breather_every == 0 {
                    info!("  [Progress: {} translations completed]", done);
                    self.limiter
                        .pause(Duration::from_millis(self.common.breather_ms))
                        .await;
                }

                TranslationOutcome::Translated(translated)
            }
            Err(reason) => {
                warn!("Translation failed, keeping source text: {}", reason);
                self.fallbacks.fetch_add(1, Ordering::SeqCst);
                self.consecutive_failures.fetch_add(1, Ordering::SeqCst);

                // Longer pause: let transient service-side throttling subside
                self.limiter.cooldown().await;

                TranslationOutcome::Fallback {
                    text: text.to_string(),
                    reason,
                }
            }
        }
    }

    async fn dispatch(
        &self,
        text: &str,
        system_prompt: &str,
        source_language: &str,
        target_language: &str,
    ) -> std::result::Result<String, String> {
        match &self.provider {
            ProviderImpl::Ollama(client) => {
                let request = GenerationRequest::new(&self.model, text)
                    .system(system_prompt)
                    .temperature(self.common.temperature);

                client
                    .complete(request)
                    .await
                    .map(|response| Ollama::extract_text(&response))
                    .map_err(|e| format!("Ollama translation error: {}", e))
            }
            ProviderImpl::OpenAI(client) => {
                let request = OpenAIRequest::new(&self.model)
                    .add_message("system", system_prompt)
                    .add_message("user", text)
                    .temperature(self.common.temperature);

                client
                    .complete(request)
                    .await
                    .map(|response| OpenAI::extract_text(&response))
                    .map_err(|e| format!("OpenAI translation error: {}", e))
            }
            ProviderImpl::Anthropic(client) => {
                let request = AnthropicRequest::new(&self.model, 4096)
                    .system(system_prompt)
                    .add_message("user", text)
                    .temperature(self.common.temperature);

                client
                    .complete(request)
                    .await
                    .map(|response| Anthropic::extract_text(&response))
                    .map_err(|e| format!("Anthropic translation error: {}", e))
            }
            ProviderImpl::Mock(client) => {
                let request = MockRequest {
                    text: text.to_string(),
                    source_language: source_language.to_string(),
                    target_language: target_language.to_string(),
                };

                client
                    .complete(request)
                    .await
                    .map(|response| MockProvider::extract_text(&response))
                    .map_err(|e| format!("Mock translation error: {}", e))
            }
        }
    }

    /// Texts the backing mock provider has received, in call order.
    /// `None` when the client is backed by a real provider.
    #[cfg(test)]
    pub(crate) fn mock_seen_texts(&self) -> Option<Vec<String>> {
        match &self.provider {
            ProviderImpl::Mock(mock) => Some(mock.seen_texts()),
            _ => None,
        }
    }

    fn build_system_prompt(&self, source_language: &str, target_language: &str) -> String {
        // Spell out language names so short codes don't confuse the model
        let source_name = language_utils::get_language_name(source_language)
            .unwrap_or_else(|_| source_language.to_string());
        let target_name = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());

        let prompt = self
            .common
            .system_prompt
            .replace("{source_language}", &source_name)
            .replace("{target_language}", &target_name);
        debug!("System prompt: {}", prompt);
        prompt
    }
}
