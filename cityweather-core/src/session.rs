//! Presentation state for one search widget.
//!
//! The session never performs I/O. User actions return a request ticket when
//! a lookup is needed; the caller runs it and feeds the outcome back with the
//! same ticket. Outcomes for anything but the most recent ticket of their kind
//! are dropped, so whichever request was issued last wins regardless of the
//! order responses arrive in.

use crate::{
    model::{GeocodeRequest, LocationCandidate, WeatherRequest, WeatherSnapshot},
    provider::ApiError,
};

/// Shown when a weather failure carries no text of its own.
pub const FALLBACK_ERROR: &str = "Error fetching weather";

/// What the widget is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Suggesting,
    Resolved,
    ResolvedExpanded,
    Errored,
}

#[derive(Debug, Default)]
pub struct Session {
    query: String,
    candidates: Vec<LocationCandidate>,
    snapshot: Option<WeatherSnapshot>,
    error: Option<String>,
    details_expanded: bool,
    geocode_seq: u64,
    weather_seq: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[LocationCandidate] {
        &self.candidates
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn details_expanded(&self) -> bool {
        self.details_expanded
    }

    pub fn phase(&self) -> Phase {
        if !self.candidates.is_empty() {
            Phase::Suggesting
        } else if self.error.is_some() {
            Phase::Errored
        } else if self.snapshot.is_some() {
            if self.details_expanded {
                Phase::ResolvedExpanded
            } else {
                Phase::Resolved
            }
        } else {
            Phase::Idle
        }
    }

    /// The search text changed.
    ///
    /// A blank query clears the suggestions and needs no lookup. The
    /// snapshot and error are left alone either way.
    pub fn edit_query(&mut self, text: impl Into<String>) -> Option<GeocodeRequest> {
        self.query = text.into();
        // Any lookup still in flight is now stale, even if no new one starts.
        self.geocode_seq += 1;

        if self.query.trim().is_empty() {
            self.candidates.clear();
            return None;
        }

        Some(GeocodeRequest {
            seq: self.geocode_seq,
            query: self.query.clone(),
        })
    }

    /// Apply a geocoding outcome. Returns `false` if it was stale and ignored.
    pub fn apply_candidates(
        &mut self,
        request: &GeocodeRequest,
        result: Result<Vec<LocationCandidate>, ApiError>,
    ) -> bool {
        if request.seq != self.geocode_seq {
            tracing::debug!(
                seq = request.seq,
                latest = self.geocode_seq,
                query = %request.query,
                "discarding stale geocoding response"
            );
            return false;
        }

        match result {
            Ok(candidates) => self.candidates = candidates,
            Err(err) => {
                tracing::warn!(
                    query = %request.query,
                    error = %err,
                    detail = ?err,
                    "geocoding lookup failed"
                );
                self.candidates.clear();
            }
        }

        true
    }

    /// Choose the candidate at `index`. Out-of-range indices do nothing.
    ///
    /// Clears the previous snapshot, error and details panel, echoes the
    /// candidate into the search text and closes the suggestion list before
    /// the weather request is issued.
    pub fn select(&mut self, index: usize) -> Option<WeatherRequest> {
        let candidate = self.candidates.get(index)?.clone();

        self.error = None;
        self.snapshot = None;
        self.details_expanded = false;
        self.query = candidate.label();
        self.candidates.clear();
        // The echoed label must not let an older suggestion list reappear.
        self.geocode_seq += 1;
        self.weather_seq += 1;

        Some(WeatherRequest {
            seq: self.weather_seq,
            latitude: candidate.latitude,
            longitude: candidate.longitude,
        })
    }

    /// Enter key: always acts on the highest-ranked candidate, if any.
    pub fn confirm(&mut self) -> Option<WeatherRequest> {
        self.select(0)
    }

    /// Apply a weather outcome. Returns `false` if it was stale and ignored.
    pub fn apply_weather(
        &mut self,
        request: &WeatherRequest,
        result: Result<WeatherSnapshot, ApiError>,
    ) -> bool {
        if request.seq != self.weather_seq {
            tracing::debug!(
                seq = request.seq,
                latest = self.weather_seq,
                "discarding stale weather response"
            );
            return false;
        }

        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(err) => {
                tracing::info!(error = %err, detail = ?err, "weather lookup failed");
                self.snapshot = None;
                self.details_expanded = false;
                self.error = Some(failure_message(&err));
            }
        }

        true
    }

    /// Show or hide the extra snapshot fields. Never triggers a lookup.
    pub fn toggle_details(&mut self) {
        self.details_expanded = !self.details_expanded;
    }
}

fn failure_message(err: &ApiError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        FALLBACK_ERROR.to_string()
    } else {
        message
    }
}
