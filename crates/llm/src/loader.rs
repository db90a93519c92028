//! Background task that opens the [`BackendGate`] once the model is loaded.
//!
//! Polls the model server's health endpoint with exponential backoff until
//! it reports ready, then keeps watching it at a fixed interval and closes
//! the gate again if the server goes away or starts reloading.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::gate::BackendGate;
use crate::model::{BackendHealth, LanguageModel};

/// Tunable parameters for the loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Delay before the second health probe.
    pub initial_delay: Duration,
    /// Upper bound on the delay between probes.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failed probe.
    pub multiplier: f64,
    /// Give up and mark the backend failed after this long. `None` waits
    /// forever.
    pub load_timeout: Option<Duration>,
    /// Probe interval once the backend is ready.
    pub monitor_interval: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            load_timeout: Some(Duration::from_secs(600)),
            monitor_interval: Duration::from_secs(30),
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`LoaderConfig::max_delay`].
pub fn next_delay(current: Duration, config: &LoaderConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// How a loading phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    TimedOut,
    Cancelled,
}

/// Run the loader until cancelled or until loading times out.
pub async fn run(
    model: Arc<dyn LanguageModel>,
    gate: Arc<BackendGate>,
    config: LoaderConfig,
    cancel: CancellationToken,
) {
    loop {
        match wait_until_ready(model.as_ref(), &gate, &config, &cancel).await {
            LoadOutcome::Ready => {}
            LoadOutcome::TimedOut => {
                gate.mark_failed();
                tracing::error!(
                    timeout_secs = config.load_timeout.map(|t| t.as_secs()),
                    "Language model did not finish loading, giving up",
                );
                return;
            }
            LoadOutcome::Cancelled => return,
        }

        if !monitor(model.as_ref(), &gate, &config, &cancel).await {
            return;
        }
    }
}

/// Probe health with exponential backoff until the model is ready.
///
/// Marks the gate ready on success. Does not touch the gate on timeout or
/// cancellation; the caller decides.
pub async fn wait_until_ready(
    model: &dyn LanguageModel,
    gate: &BackendGate,
    config: &LoaderConfig,
    cancel: &CancellationToken,
) -> LoadOutcome {
    let deadline = config.load_timeout.map(|t| Instant::now() + t);
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Model loader cancelled");
                return LoadOutcome::Cancelled;
            }
            result = model.health() => {
                match result {
                    Ok(BackendHealth::Ready) => {
                        tracing::info!(attempt, "Language model loaded");
                        gate.mark_ready();
                        return LoadOutcome::Ready;
                    }
                    Ok(BackendHealth::Loading) => {
                        tracing::debug!(attempt, "Language model still loading");
                    }
                    Err(e) => {
                        tracing::warn!(attempt, error = %e, "Model server health probe failed");
                    }
                }
            }
        }

        if deadline.is_some_and(|d| Instant::now() + delay > d) {
            return LoadOutcome::TimedOut;
        }

        // Wait before the next attempt, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => return LoadOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, config);
    }
}

/// Watch a ready backend. Returns `true` when the backend was lost (gate
/// closed again) and `false` on cancellation.
async fn monitor(
    model: &dyn LanguageModel,
    gate: &BackendGate,
    config: &LoaderConfig,
    cancel: &CancellationToken,
) -> bool {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(config.monitor_interval) => {}
        }

        match model.health().await {
            Ok(BackendHealth::Ready) => {}
            Ok(BackendHealth::Loading) => {
                tracing::warn!("Language model is reloading");
                gate.mark_loading();
                return true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Lost contact with model server");
                gate.mark_loading();
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::gate::BackendState;
    use crate::model::CompletionParams;

    /// Replays a fixed sequence of health answers, then repeats the last.
    struct Scripted {
        answers: Mutex<VecDeque<BackendHealth>>,
        last: BackendHealth,
    }

    impl Scripted {
        fn new(answers: &[BackendHealth]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().copied().collect()),
                last: *answers.last().unwrap(),
            }
        }

        fn remaining(&self) -> usize {
            self.answers.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for Scripted {
        async fn health(&self) -> Result<BackendHealth, LlmError> {
            Ok(self.answers.lock().unwrap().pop_front().unwrap_or(self.last))
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![])
        }

        async fn complete(&self, _prompt: &str, _params: CompletionParams) -> Result<String, LlmError> {
            Ok(String::new())
        }
    }

    fn fast_config() -> LoaderConfig {
        LoaderConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
            load_timeout: Some(Duration::from_secs(5)),
            monitor_interval: Duration::from_millis(1),
        }
    }

    // -- Backoff ---------------------------------------------------------------

    #[test]
    fn next_delay_doubles() {
        let config = LoaderConfig::default();
        assert_eq!(next_delay(Duration::from_secs(1), &config), Duration::from_secs(2));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = LoaderConfig::default();
        let mut delay = config.initial_delay;
        let expected = [1, 2, 4, 8, 16, 30, 30];
        for secs in expected {
            assert_eq!(delay, Duration::from_secs(secs));
            delay = next_delay(delay, &config);
        }
    }

    // -- Loading -----------------------------------------------------------------

    #[tokio::test]
    async fn gate_opens_after_loading_finishes() {
        let model = Scripted::new(&[
            BackendHealth::Loading,
            BackendHealth::Loading,
            BackendHealth::Ready,
        ]);
        let gate = BackendGate::new();

        let outcome =
            wait_until_ready(&model, &gate, &fast_config(), &CancellationToken::new()).await;

        assert_eq!(outcome, LoadOutcome::Ready);
        assert!(gate.is_ready());
    }

    #[tokio::test]
    async fn never_loading_model_times_out() {
        let model = Scripted::new(&[BackendHealth::Loading]);
        let gate = Arc::new(BackendGate::new());
        let config = LoaderConfig {
            load_timeout: Some(Duration::from_millis(20)),
            ..fast_config()
        };

        run(Arc::new(model), Arc::clone(&gate), config, CancellationToken::new()).await;

        assert_eq!(gate.state(), BackendState::Failed);
    }

    #[tokio::test]
    async fn cancellation_stops_loader_without_opening_gate() {
        let model = Scripted::new(&[BackendHealth::Loading]);
        let gate = BackendGate::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = wait_until_ready(&model, &gate, &fast_config(), &cancel).await;

        assert_eq!(outcome, LoadOutcome::Cancelled);
        assert_eq!(gate.state(), BackendState::Loading);
    }

    #[tokio::test]
    async fn monitor_closes_gate_when_model_reloads() {
        let model = Scripted::new(&[BackendHealth::Ready, BackendHealth::Loading]);
        let gate = BackendGate::ready();

        let lost = monitor(&model, &gate, &fast_config(), &CancellationToken::new()).await;

        assert!(lost);
        assert_eq!(gate.state(), BackendState::Loading);
    }

    #[tokio::test]
    async fn gate_reopens_after_model_reloads() {
        let model = Arc::new(Scripted::new(&[
            BackendHealth::Ready,
            BackendHealth::Loading,
            BackendHealth::Loading,
            BackendHealth::Ready,
        ]));
        let gate = Arc::new(BackendGate::new());
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(
            Arc::clone(&model) as Arc<dyn LanguageModel>,
            Arc::clone(&gate),
            fast_config(),
            cancel.clone(),
        ));

        // Every scripted answer consumed and the gate open again means the
        // loader went through monitor, reload and a second loading phase.
        tokio::time::timeout(Duration::from_secs(5), async {
            while model.remaining() > 0 || !gate.is_ready() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("gate did not reopen");

        assert_eq!(gate.state(), BackendState::Ready);

        cancel.cancel();
        handle.await.unwrap();
    }
}
