//! As-you-type city suggestions for the interactive search prompt.

use std::{sync::Arc, time::Duration};

use cityweather_core::{Input, LocationCandidate, Widget};
use inquire::{
    CustomUserError,
    autocompletion::{Autocomplete, Replacement},
};
use tokio::{runtime::Handle, sync::Mutex};

/// How long one keystroke may wait for its geocoding lookup.
const SUGGESTION_WAIT: Duration = Duration::from_millis(400);

/// Feeds every edit of the search text into the shared widget and offers
/// the resulting candidate labels as completions.
///
/// The prompt calls back synchronously, so lookups are driven by blocking
/// the calling thread on `runtime`. Must be used from a multi-threaded
/// runtime, and the widget must not be locked while the prompt is open.
#[derive(Debug, Clone)]
pub struct CitySuggester {
    widget: Arc<Mutex<Widget>>,
    runtime: Handle,
}

impl CitySuggester {
    pub fn new(widget: Arc<Mutex<Widget>>, runtime: Handle) -> Self {
        Self { widget, runtime }
    }

    async fn suggest(&self, input: &str) -> Vec<String> {
        let mut widget = self.widget.lock().await;

        if widget.session().query() != input {
            widget.handle(Input::QueryChanged(input.to_string()));
        }
        if tokio::time::timeout(SUGGESTION_WAIT, widget.settle())
            .await
            .is_err()
        {
            tracing::debug!(query = input, "suggestions not ready yet");
        }

        candidate_labels(&widget)
    }
}

impl Autocomplete for CitySuggester {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let labels = tokio::task::block_in_place(|| self.runtime.block_on(self.suggest(input)));
        Ok(labels)
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

/// Labels of the widget's current candidates, in ranked order.
pub fn candidate_labels(widget: &Widget) -> Vec<String> {
    widget
        .session()
        .candidates()
        .iter()
        .map(LocationCandidate::label)
        .collect()
}
