//! Event loop glue between user input, the session and the network.
//!
//! Input is applied synchronously. Any lookup it triggers runs on its own
//! task and reports back through a channel; completions are applied one at a
//! time on the driving task, in whatever order they arrive.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    model::{GeocodeRequest, LocationCandidate, WeatherRequest, WeatherSnapshot},
    provider::{ApiError, GEOCODE_LIMIT, Geocoder, WeatherProvider},
    session::Session,
};

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// The search text now reads this.
    QueryChanged(String),
    /// A suggestion was clicked.
    Select(usize),
    /// Enter was pressed in the search field.
    Confirm,
    ToggleDetails,
}

#[derive(Debug)]
enum Completion {
    Candidates(GeocodeRequest, Result<Vec<LocationCandidate>, ApiError>),
    Weather(WeatherRequest, Result<WeatherSnapshot, ApiError>),
}

/// Sends exactly one completion per lookup task.
///
/// A task that panics or is cancelled before calling `finish` sends its
/// fallback from `drop`, so the widget's in-flight count still drains.
struct Reporter {
    tx: mpsc::UnboundedSender<Completion>,
    fallback: Option<Completion>,
}

impl Reporter {
    fn new(tx: mpsc::UnboundedSender<Completion>, fallback: Completion) -> Self {
        Self {
            tx,
            fallback: Some(fallback),
        }
    }

    fn finish(mut self, completion: Completion) {
        self.fallback = None;
        // Receiver lives as long as the widget; nothing to do if it's gone.
        let _ = self.tx.send(completion);
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if let Some(fallback) = self.fallback.take() {
            tracing::warn!("lookup task ended without reporting a result");
            let _ = self.tx.send(fallback);
        }
    }
}

#[derive(Debug)]
pub struct Widget {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    session: Session,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl Widget {
    pub fn new(geocoder: Arc<dyn Geocoder>, weather: Arc<dyn WeatherProvider>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            geocoder,
            weather,
            session: Session::new(),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of lookups issued whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply an input and start whatever lookup it calls for.
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle(&mut self, input: Input) {
        match input {
            Input::QueryChanged(text) => {
                if let Some(request) = self.session.edit_query(text) {
                    self.spawn_geocode(request);
                }
            }
            Input::Select(index) => {
                if let Some(request) = self.session.select(index) {
                    self.spawn_weather(request);
                }
            }
            Input::Confirm => {
                if let Some(request) = self.session.confirm() {
                    self.spawn_weather(request);
                }
            }
            Input::ToggleDetails => self.session.toggle_details(),
        }
    }

    /// Wait for the next lookup to finish and apply it.
    ///
    /// Returns `false` immediately when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }

        // The widget holds a sender, so the channel never closes under us.
        let Some(completion) = self.rx.recv().await else {
            return false;
        };
        self.in_flight -= 1;

        match completion {
            Completion::Candidates(request, result) => {
                self.session.apply_candidates(&request, result);
            }
            Completion::Weather(request, result) => {
                self.session.apply_weather(&request, result);
            }
        }

        true
    }

    /// Apply completions until no lookup is outstanding.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn spawn_geocode(&mut self, request: GeocodeRequest) {
        tracing::debug!(seq = request.seq, query = %request.query, "starting geocoding lookup");

        let geocoder = Arc::clone(&self.geocoder);
        let fallback = Completion::Candidates(request.clone(), Err(ApiError::Interrupted));
        let reporter = Reporter::new(self.tx.clone(), fallback);
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = geocoder.search(&request.query, GEOCODE_LIMIT).await;
            reporter.finish(Completion::Candidates(request, result));
        });
    }

    fn spawn_weather(&mut self, request: WeatherRequest) {
        tracing::debug!(
            seq = request.seq,
            lat = request.latitude,
            lon = request.longitude,
            "starting weather lookup"
        );

        let weather = Arc::clone(&self.weather);
        let fallback = Completion::Weather(request.clone(), Err(ApiError::Interrupted));
        let reporter = Reporter::new(self.tx.clone(), fallback);
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = weather.current(request.latitude, request.longitude).await;
            reporter.finish(Completion::Weather(request, result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Phase;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::{collections::HashMap, sync::Mutex, time::Duration};

    fn city(name: &str, country: &str, latitude: f64, longitude: f64) -> LocationCandidate {
        LocationCandidate {
            name: name.into(),
            country: country.into(),
            latitude,
            longitude,
        }
    }

    /// Geocoder answering from a fixed table, each query after its own delay.
    #[derive(Debug, Default)]
    struct FakeGeocoder {
        answers: HashMap<String, (Duration, Vec<LocationCandidate>)>,
        panic_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn answer(
            mut self,
            query: &str,
            delay_ms: u64,
            candidates: Vec<LocationCandidate>,
        ) -> Self {
            let delay = Duration::from_millis(delay_ms);
            self.answers.insert(query.to_string(), (delay, candidates));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(
            &self,
            query: &str,
            limit: usize,
        ) -> Result<Vec<LocationCandidate>, ApiError> {
            assert_eq!(limit, GEOCODE_LIMIT);
            self.calls.lock().unwrap().push(query.to_string());

            if self.panic_on.as_deref() == Some(query) {
                panic!("geocoder blew up on {query}");
            }

            match self.answers.get(query) {
                Some((delay, candidates)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(candidates.clone())
                }
                None => Err(ApiError::Status {
                    status: StatusCode::NOT_FOUND,
                    message: None,
                }),
            }
        }
    }

    #[derive(Debug, Default)]
    struct FakeWeather {
        fail_with: Option<String>,
        panics: bool,
        calls: Mutex<Vec<(f64, f64)>>,
    }

    impl FakeWeather {
        fn calls(&self) -> Vec<(f64, f64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<WeatherSnapshot, ApiError> {
            self.calls.lock().unwrap().push((latitude, longitude));

            if self.panics {
                panic!("weather provider blew up");
            }
            if let Some(message) = &self.fail_with {
                return Err(ApiError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: Some(message.clone()),
                });
            }

            Ok(WeatherSnapshot {
                location_name: "London".into(),
                country_code: "GB".into(),
                temperature_c: 14.6,
                feels_like_c: 13.9,
                humidity_pct: 72,
                wind_speed_mps: 4.1,
                condition_summary: "Clouds".into(),
                condition_description: "broken clouds".into(),
                icon: "04d".into(),
                utc_offset_secs: 0,
            })
        }
    }

    fn widget(geocoder: &Arc<FakeGeocoder>, weather: &Arc<FakeWeather>) -> Widget {
        Widget::new(geocoder.clone(), weather.clone())
    }

    fn london_geocoder() -> Arc<FakeGeocoder> {
        Arc::new(FakeGeocoder::default().answer(
            "Lon",
            1,
            vec![city("London", "GB", 51.51, -0.13)],
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn search_select_and_resolve() {
        let geocoder = london_geocoder();
        let weather = Arc::new(FakeWeather::default());
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("Lon".into()));
        widget.settle().await;
        assert_eq!(widget.session().phase(), Phase::Suggesting);

        widget.handle(Input::Select(0));
        assert_eq!(widget.session().query(), "London, GB");
        assert!(widget.session().candidates().is_empty());

        widget.settle().await;
        assert_eq!(weather.calls(), vec![(51.51, -0.13)]);
        assert_eq!(widget.session().phase(), Phase::Resolved);
        assert_eq!(widget.session().query(), "London, GB");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_suggestions_do_not_overwrite_newer_ones() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .answer("L", 100, vec![city("Lagos", "NG", 6.45, 3.39)])
                .answer("Lo", 10, vec![city("London", "GB", 51.51, -0.13)]),
        );
        let weather = Arc::new(FakeWeather::default());
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("L".into()));
        widget.handle(Input::QueryChanged("Lo".into()));
        assert_eq!(widget.in_flight(), 2);

        widget.settle().await;
        assert_eq!(geocoder.calls(), vec!["L".to_string(), "Lo".to_string()]);
        assert_eq!(
            widget.session().candidates(),
            &[city("London", "GB", 51.51, -0.13)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn blank_query_sends_nothing() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let weather = Arc::new(FakeWeather::default());
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("  ".into()));
        assert_eq!(widget.in_flight(), 0);
        assert!(!widget.next_completion().await);
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn enter_selects_first_candidate() {
        let geocoder = Arc::new(FakeGeocoder::default().answer(
            "London",
            1,
            vec![
                city("London", "GB", 51.51, -0.13),
                city("London", "CA", 42.98, -81.25),
            ],
        ));
        let weather = Arc::new(FakeWeather::default());
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("London".into()));
        widget.settle().await;
        widget.handle(Input::Confirm);
        widget.settle().await;

        assert_eq!(weather.calls(), vec![(51.51, -0.13)]);
    }

    #[tokio::test(start_paused = true)]
    async fn weather_failure_shows_error_without_snapshot() {
        let geocoder = london_geocoder();
        let weather = Arc::new(FakeWeather {
            fail_with: Some("Network Error".into()),
            ..Default::default()
        });
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("Lon".into()));
        widget.settle().await;
        widget.handle(Input::Select(0));
        widget.settle().await;

        assert_eq!(widget.session().error(), Some("Network Error"));
        assert_eq!(widget.session().snapshot(), None);
        assert_eq!(widget.session().phase(), Phase::Errored);
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_details_issues_no_request() {
        let geocoder = london_geocoder();
        let weather = Arc::new(FakeWeather::default());
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("Lon".into()));
        widget.settle().await;
        widget.handle(Input::Select(0));
        widget.settle().await;

        widget.handle(Input::ToggleDetails);
        assert_eq!(widget.in_flight(), 0);
        assert_eq!(widget.session().phase(), Phase::ResolvedExpanded);
        assert_eq!(geocoder.calls().len(), 1);
        assert_eq!(weather.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn geocoding_failure_clears_suggestions() {
        let geocoder = london_geocoder();
        let weather = Arc::new(FakeWeather::default());
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("Lon".into()));
        widget.settle().await;
        widget.handle(Input::QueryChanged("Lonx".into()));
        widget.settle().await;

        assert!(widget.session().candidates().is_empty());
        assert_eq!(widget.session().error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_geocoder_does_not_stall_settle() {
        let geocoder = Arc::new(FakeGeocoder {
            panic_on: Some("boom".into()),
            ..Default::default()
        });
        let weather = Arc::new(FakeWeather::default());
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("boom".into()));
        widget.settle().await;

        assert_eq!(widget.in_flight(), 0);
        assert!(widget.session().candidates().is_empty());
        assert_eq!(widget.session().error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_weather_lookup_surfaces_an_error() {
        let geocoder = london_geocoder();
        let weather = Arc::new(FakeWeather {
            panics: true,
            ..Default::default()
        });
        let mut widget = widget(&geocoder, &weather);

        widget.handle(Input::QueryChanged("Lon".into()));
        widget.settle().await;
        widget.handle(Input::Confirm);
        widget.settle().await;

        assert_eq!(widget.in_flight(), 0);
        assert_eq!(widget.session().error(), Some("Lookup was interrupted"));
        assert_eq!(widget.session().phase(), Phase::Errored);
    }
}
