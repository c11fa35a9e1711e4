//! Debounced, cancellable search suggestions.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use vader_core::CarouselConfig;
use vader_weather::{WeatherError, WeatherSource};

use crate::state::SharedState;

pub struct SuggestionEngine<S: WeatherSource> {
    source: Arc<S>,
    state: SharedState,
    debounce: Duration,
    min_chars: usize,
    limit: usize,
    /// Token of the most recent query; cancelling it silences that query
    pending: Mutex<Option<CancellationToken>>,
}

impl<S: WeatherSource> SuggestionEngine<S> {
    pub fn new(source: Arc<S>, state: SharedState, config: &CarouselConfig) -> Self {
        Self {
            source,
            state,
            debounce: Duration::from_millis(config.suggest_debounce_ms),
            min_chars: config.suggest_min_chars,
            limit: config.suggest_limit,
            pending: Mutex::new(None),
        }
    }

    /// Feed the latest search box text.
    ///
    /// Supersedes whatever the previous call started. Short queries clear
    /// the suggestions at once; anything else is looked up after the
    /// debounce period unless another call comes first.
    pub fn on_query_changed(self: &Arc<Self>, query: &str) {
        self.cancel();

        let query = query.trim();
        if query.chars().count() < self.min_chars {
            self.state.lock().suggestions.clear();
            return;
        }

        let token = CancellationToken::new();
        *self.pending.lock() = Some(token.clone());

        let this = Arc::clone(self);
        let query = query.to_string();
        tokio::spawn(async move {
            this.run(query, token).await;
        });
    }

    /// Drop the current suggestions and silence any outstanding lookup.
    pub fn clear(&self) {
        self.cancel();
        self.state.lock().suggestions.clear();
    }

    fn cancel(&self) {
        if let Some(token) = self.pending.lock().take() {
            token.cancel();
        }
        self.state.lock().suggesting = false;
    }

    async fn run(&self, query: String, token: CancellationToken) {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(self.debounce) => {}
        }

        {
            let mut state = self.state.lock();
            if token.is_cancelled() {
                return;
            }
            state.suggesting = true;
        }
        tracing::debug!("Looking up suggestions for {:?}", query);

        let result = tokio::select! {
            _ = token.cancelled() => Err(WeatherError::Aborted),
            result = self.source.suggest(&query, self.limit) => result,
        };

        let mut state = self.state.lock();
        if token.is_cancelled() {
            return;
        }
        state.suggesting = false;
        match result {
            Ok(mut suggestions) => {
                suggestions.truncate(self.limit);
                state.suggestions = suggestions;
            }
            Err(e) if e.is_silent() => {}
            Err(e) => {
                tracing::debug!("Suggestion lookup for {:?} failed: {}", query, e);
                state.suggestions.clear();
            }
        }
    }
}
