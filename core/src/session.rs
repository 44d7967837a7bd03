//! One search session: the search/filter state machine behind the results
//! page.
//!
//! # Design
//! A remote call is split in three steps so that stale answers can be
//! recognized: `begin_search` / `begin_filter` validate, move the state
//! machine and hand out a `PendingCall` tagged with a monotonic sequence
//! number; the caller runs it against a repository; `complete` applies the
//! outcome only if that call is still the latest one issued and the session
//! has not been torn down. `search` and `apply_filters` chain the three
//! steps for synchronous callers.
//!
//! ```text
//! Idle -> Searching -> Results | SearchFailed
//! Results -> Filtering -> Results | FilterFailed
//! SearchFailed / FilterFailed -> (retry) Searching / Filtering
//! ```

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::change::{decide_refresh, RefreshAction, SearchSnapshot};
use crate::config::AppConfig;
use crate::criteria::{FilterCriteria, SearchCriteria};
use crate::error::ApiError;
use crate::mapper::{MapperDefaults, MapperOptions};
use crate::ordering::ResultsView;
use crate::repository::FlightRepository;
use crate::stream::{StateStream, Subscription, Teardown, TeardownSignal};
use crate::types::{BookingLink, FiltersBoundary, FlightTicket, SearchResult};
use crate::validation::{validate, FormConfig, ValidationError};

/// Where the results page sends the user when it has nothing to show.
pub const SEARCH_PAGE: &str = "/search";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Searching,
    Results,
    SearchFailed,
    Filtering,
    FilterFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// A call succeeded with this many tickets.
    Found(usize),
    NoMatches,
    /// A call failed; carries the error text for the detail line.
    Failed(String),
    /// The display currency changed; prices refresh on the next apply.
    CurrencyChanged(String),
}

/// A dismissable, self-expiring message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub severity: Severity,
    pub lifetime: Duration,
}

impl Notice {
    pub fn found(count: usize) -> Self {
        Self {
            kind: NoticeKind::Found(count),
            severity: Severity::Success,
            lifetime: Duration::from_millis(3000),
        }
    }

    pub fn no_matches() -> Self {
        Self {
            kind: NoticeKind::NoMatches,
            severity: Severity::Warn,
            lifetime: Duration::from_millis(5000),
        }
    }

    pub fn failed(err: &ApiError) -> Self {
        Self {
            kind: NoticeKind::Failed(err.to_string()),
            severity: Severity::Error,
            lifetime: Duration::from_millis(5000),
        }
    }

    pub fn currency_changed(code: &str) -> Self {
        Self {
            kind: NoticeKind::CurrencyChanged(code.to_string()),
            severity: Severity::Info,
            lifetime: Duration::from_millis(6000),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    /// The form has errors; every field should be shown as touched.
    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    #[error("session has been torn down")]
    TornDown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallRequest {
    Search(SearchCriteria),
    /// A new search requested from the filter panel. Its constraints are
    /// applied to the fresh result set before the call completes.
    SearchAndFilter(FilterCriteria),
    Filter {
        criteria: FilterCriteria,
        search_id: String,
    },
}

/// A remote call the session is waiting on.
#[derive(Debug, Clone)]
pub struct PendingCall {
    seq: u64,
    request: CallRequest,
    snapshot: SearchSnapshot,
    options: MapperOptions,
    currency: String,
    locale: String,
}

impl PendingCall {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &CallRequest {
        &self.request
    }

    pub fn is_search(&self) -> bool {
        matches!(
            self.request,
            CallRequest::Search(_) | CallRequest::SearchAndFilter(_)
        )
    }

    /// Perform the call. Holds no session borrow, so it may run anywhere.
    pub fn run(&self, repo: &dyn FlightRepository) -> Result<SearchResult, ApiError> {
        match &self.request {
            CallRequest::Search(criteria) => {
                repo.search_flights(criteria, &self.currency, &self.locale, &self.options)
            }
            CallRequest::SearchAndFilter(filters) => {
                let found = repo.search_flights(
                    &filters.search,
                    &self.currency,
                    &self.locale,
                    &self.options,
                )?;
                match found.search_id.as_deref() {
                    Some(search_id) if filters.has_constraints() => repo.filter_flights(
                        filters,
                        search_id,
                        &self.currency,
                        &self.locale,
                        &self.options,
                    ),
                    _ => Ok(found),
                }
            }
            CallRequest::Filter {
                criteria,
                search_id,
            } => repo.filter_flights(
                criteria,
                search_id,
                &self.currency,
                &self.locale,
                &self.options,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied(Notice),
    /// A newer call was issued after this one; the outcome was dropped.
    Stale,
    /// The session was torn down before the outcome arrived.
    Discarded,
}

/// Navigation state handed from the search page to the results page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsHandoff {
    pub search_results: SearchResult,
    pub search_params: SearchCriteria,
    pub currency: String,
    pub locale: String,
    pub search_id: Option<String>,
}

/// The results page was opened without search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no search state, redirecting to {path}")]
pub struct Redirect {
    pub path: &'static str,
}

pub struct SearchSession {
    state: StateStream<SessionState>,
    notices: StateStream<Option<Notice>>,
    teardown: Teardown,
    view: ResultsView,
    boundary: FiltersBoundary,
    mapper_defaults: MapperDefaults,
    currency: String,
    locale: String,
    last_criteria: Option<SearchCriteria>,
    last_snapshot: Option<SearchSnapshot>,
    search_id: Option<String>,
    next_seq: u64,
    latest_seq: Option<u64>,
}

impl SearchSession {
    pub fn new(config: &AppConfig, currency: &str, locale: &str) -> Self {
        Self {
            state: StateStream::new(SessionState::Idle),
            notices: StateStream::new(None),
            teardown: Teardown::new(),
            view: ResultsView::new(Vec::new(), &config.results),
            boundary: FiltersBoundary::default(),
            mapper_defaults: config.mapper.clone(),
            currency: currency.to_string(),
            locale: locale.to_string(),
            last_criteria: None,
            last_snapshot: None,
            search_id: None,
            next_seq: 0,
            latest_seq: None,
        }
    }

    /// Open the results page from navigation state.
    pub fn from_handoff(
        handoff: Option<ResultsHandoff>,
        config: &AppConfig,
    ) -> Result<Self, Redirect> {
        let Some(handoff) = handoff else {
            info!("results page opened without search state");
            return Err(Redirect { path: SEARCH_PAGE });
        };
        let mut session = Self::new(config, &handoff.currency, &handoff.locale);
        session.search_id = handoff
            .search_id
            .or_else(|| handoff.search_results.search_id.clone());
        session.last_snapshot = Some(SearchSnapshot::of(&handoff.search_params));
        session.last_criteria = Some(handoff.search_params);
        session.boundary = handoff.search_results.filters_boundary;
        session.view.replace(handoff.search_results.flight_tickets);
        session.state.publish(SessionState::Results);
        Ok(session)
    }

    /// Package the last successful search for the results page.
    pub fn handoff(&self) -> Option<ResultsHandoff> {
        let criteria = self.last_criteria.clone()?;
        Some(ResultsHandoff {
            search_results: SearchResult {
                search_id: self.search_id.clone(),
                flight_tickets: self.view.tickets().to_vec(),
                filters_boundary: self.boundary.clone(),
            },
            search_params: criteria,
            currency: self.currency.clone(),
            locale: self.locale.clone(),
            search_id: self.search_id.clone(),
        })
    }

    pub fn begin_search(&mut self, criteria: &SearchCriteria) -> Result<PendingCall, SubmitError> {
        self.ensure_live()?;
        let errors = validate(criteria, &FormConfig::search());
        if !errors.is_empty() {
            debug!(count = errors.len(), "search blocked by validation");
            return Err(SubmitError::Invalid(errors));
        }
        let options = MapperOptions::strict().using(self.mapper_defaults.clone());
        Ok(self.issue(CallRequest::Search(criteria.clone()), criteria, options))
    }

    /// Decide between a new search and a filter of the current one.
    pub fn begin_filter(&mut self, filters: &FilterCriteria) -> Result<PendingCall, SubmitError> {
        self.ensure_live()?;
        let errors = validate(&filters.search, &FormConfig::filters());
        if !errors.is_empty() {
            return Err(SubmitError::Invalid(errors));
        }
        let options = MapperOptions::with_defaults().using(self.mapper_defaults.clone());
        let action = decide_refresh(
            self.last_snapshot.as_ref(),
            self.search_id.as_deref(),
            &filters.search,
        );
        let request = match (action, &self.search_id) {
            (RefreshAction::Filter, Some(search_id)) => CallRequest::Filter {
                criteria: filters.clone(),
                search_id: search_id.clone(),
            },
            _ => CallRequest::SearchAndFilter(filters.clone()),
        };
        info!(?action, "applying filters");
        Ok(self.issue(request, &filters.search, options))
    }

    fn issue(
        &mut self,
        request: CallRequest,
        criteria: &SearchCriteria,
        options: MapperOptions,
    ) -> PendingCall {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq = Some(seq);
        let state = match request {
            CallRequest::Search(_) | CallRequest::SearchAndFilter(_) => SessionState::Searching,
            CallRequest::Filter { .. } => SessionState::Filtering,
        };
        self.state.publish(state);
        PendingCall {
            seq,
            request,
            snapshot: SearchSnapshot::of(criteria),
            options,
            currency: self.currency.clone(),
            locale: self.locale.clone(),
        }
    }

    pub fn complete(
        &mut self,
        call: PendingCall,
        outcome: Result<SearchResult, ApiError>,
    ) -> Completion {
        if self.teardown.is_fired() {
            debug!(seq = call.seq, "session torn down, dropping response");
            return Completion::Discarded;
        }
        if self.latest_seq != Some(call.seq) {
            debug!(seq = call.seq, latest = ?self.latest_seq, "dropping stale response");
            return Completion::Stale;
        }
        self.latest_seq = None;

        let notice = match outcome {
            Ok(result) => {
                let count = result.flight_tickets.len();
                info!(seq = call.seq, count, "flight results received");
                let searched = match call.request {
                    CallRequest::Search(criteria) => Some(criteria),
                    CallRequest::SearchAndFilter(filters) => Some(filters.search),
                    CallRequest::Filter { .. } => None,
                };
                if let Some(criteria) = searched {
                    self.search_id = result.search_id.clone();
                    self.last_snapshot = Some(call.snapshot);
                    self.last_criteria = Some(criteria);
                } else if let Some(id) = result.search_id.clone() {
                    self.search_id = Some(id);
                }
                self.boundary = result.filters_boundary;
                self.view.replace(result.flight_tickets);
                self.state.publish(SessionState::Results);
                if count == 0 {
                    Notice::no_matches()
                } else {
                    Notice::found(count)
                }
            }
            Err(err) => {
                warn!(seq = call.seq, error = %err, "flight call failed");
                let failed = if call.is_search() {
                    SessionState::SearchFailed
                } else {
                    SessionState::FilterFailed
                };
                self.state.publish(failed);
                Notice::failed(&err)
            }
        };
        self.notices.publish(Some(notice.clone()));
        Completion::Applied(notice)
    }

    pub fn search(
        &mut self,
        repo: &dyn FlightRepository,
        criteria: &SearchCriteria,
    ) -> Result<Completion, SubmitError> {
        let call = self.begin_search(criteria)?;
        let outcome = call.run(repo);
        Ok(self.complete(call, outcome))
    }

    pub fn apply_filters(
        &mut self,
        repo: &dyn FlightRepository,
        filters: &FilterCriteria,
    ) -> Result<Completion, SubmitError> {
        let call = self.begin_filter(filters)?;
        let outcome = call.run(repo);
        Ok(self.complete(call, outcome))
    }

    /// Booking failures are shown to the user, unlike lookups.
    pub fn booking_link(
        &self,
        repo: &dyn FlightRepository,
        ticket: &FlightTicket,
    ) -> Result<BookingLink, ApiError> {
        let result = match (self.search_id.as_deref(), ticket.terms_url.as_deref()) {
            (Some(search_id), Some(terms)) => repo.get_booking_link(search_id, terms),
            _ => Err(ApiError::NotFound),
        };
        if let Err(err) = &result {
            warn!(error = %err, "booking link unavailable");
            self.notices.publish(Some(Notice::failed(err)));
        }
        result
    }

    /// Stop accepting responses and end every subscription handed out.
    pub fn teardown(&self) {
        debug!("tearing down search session");
        self.teardown.fire();
    }

    fn ensure_live(&self) -> Result<(), SubmitError> {
        if self.teardown.is_fired() {
            Err(SubmitError::TornDown)
        } else {
            Ok(())
        }
    }

    pub fn set_currency(&mut self, code: &str) {
        if self.currency != code {
            self.currency = code.to_string();
            self.notices.publish(Some(Notice::currency_changed(code)));
        }
    }

    pub fn set_locale(&mut self, locale: &str) {
        self.locale = locale.to_string();
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn watch_state(&self) -> Subscription<SessionState> {
        self.state.subscribe(&self.teardown.signal())
    }

    pub fn watch_notices(&self) -> Subscription<Option<Notice>> {
        self.notices.subscribe(&self.teardown.signal())
    }

    /// Subscribe with a consumer-owned teardown instead of the session's.
    pub fn watch_state_until(&self, signal: &TeardownSignal) -> Subscription<SessionState> {
        self.state.subscribe(signal)
    }

    pub fn results(&self) -> &ResultsView {
        &self.view
    }

    pub fn results_mut(&mut self) -> &mut ResultsView {
        &mut self.view
    }

    pub fn boundary(&self) -> &FiltersBoundary {
        &self.boundary
    }

    pub fn search_id(&self) -> Option<&str> {
        self.search_id.as_deref()
    }

    pub fn last_search(&self) -> Option<&SearchCriteria> {
        self.last_criteria.as_ref()
    }

    /// The filter panel's starting point.
    pub fn filter_criteria(&self) -> FilterCriteria {
        self.last_criteria
            .as_ref()
            .map(FilterCriteria::seeded_from)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CityInput, TripType};
    use crate::fake::FakeFlightRepository;
    use chrono::NaiveDate;

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            trip_type: TripType::RoundTrip,
            origin: Some(CityInput::Code("BOG".into())),
            destination: Some(CityInput::Code("MAD".into())),
            departure_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            return_date: NaiveDate::from_ymd_opt(2025, 3, 8),
            ..SearchCriteria::default()
        }
    }

    fn session() -> SearchSession {
        SearchSession::new(&AppConfig::default(), "USD", "es")
    }

    #[test]
    fn successful_search_moves_to_results() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        let mut states = session.watch_state();

        let completion = session.search(&repo, &criteria()).unwrap();

        assert_eq!(completion, Completion::Applied(Notice::found(5)));
        assert_eq!(session.state(), SessionState::Results);
        assert_eq!(states.next_change(), Some(SessionState::Results));
        assert!(session.search_id().unwrap().starts_with("mock-search-"));
        assert_eq!(session.results().displayed_len(), 5);
    }

    #[test]
    fn invalid_form_never_reaches_repository() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        let err = session.search(&repo, &SearchCriteria::default()).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ref errors) if !errors.is_empty()));
        assert_eq!(repo.search_calls(), 0);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn failed_search_keeps_previous_results() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        session.search(&repo, &criteria()).unwrap();

        repo.push_search_response(Err(ApiError::Timeout));
        let completion = session.search(&repo, &criteria()).unwrap();

        assert_eq!(
            completion,
            Completion::Applied(Notice::failed(&ApiError::Timeout))
        );
        assert_eq!(session.state(), SessionState::SearchFailed);
        assert_eq!(session.results().len(), 5);

        // Retry is allowed from the failed state.
        session.search(&repo, &criteria()).unwrap();
        assert_eq!(session.state(), SessionState::Results);
    }

    #[test]
    fn empty_result_is_no_matches_not_failure() {
        let repo = FakeFlightRepository::new();
        repo.push_search_response(Ok(SearchResult::default()));
        let mut session = session();
        let completion = session.search(&repo, &criteria()).unwrap();
        assert_eq!(completion, Completion::Applied(Notice::no_matches()));
        assert_eq!(session.state(), SessionState::Results);
    }

    #[test]
    fn stale_response_is_dropped() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        let first = session.begin_search(&criteria()).unwrap();
        let second = session.begin_search(&criteria()).unwrap();

        let second_outcome = second.run(&repo);
        assert!(matches!(
            session.complete(second, second_outcome),
            Completion::Applied(_)
        ));
        let id = session.search_id().map(str::to_string);

        let first_outcome = first.run(&repo);
        assert_eq!(session.complete(first, first_outcome), Completion::Stale);
        assert_eq!(session.search_id().map(str::to_string), id);
    }

    #[test]
    fn unchanged_route_filters_existing_search() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        session.search(&repo, &criteria()).unwrap();
        let id = session.search_id().map(str::to_string);

        let mut filters = session.filter_criteria();
        filters.allow_layovers = Some(false);
        let call = session.begin_filter(&filters).unwrap();
        assert!(!call.is_search());
        assert_eq!(session.state(), SessionState::Filtering);

        let outcome = call.run(&repo);
        session.complete(call, outcome);
        assert_eq!(repo.filter_calls(), 1);
        assert_eq!(session.search_id().map(str::to_string), id);
        assert_eq!(session.results().len(), 3);
    }

    #[test]
    fn changed_passengers_trigger_new_search() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        session.search(&repo, &criteria()).unwrap();
        let first_id = session.search_id().map(str::to_string);

        let mut filters = session.filter_criteria();
        filters.search.passengers.adults = 2;
        session.apply_filters(&repo, &filters).unwrap();

        assert_eq!(repo.search_calls(), 2);
        assert_eq!(repo.filter_calls(), 0);
        assert_ne!(session.search_id().map(str::to_string), first_id);
        assert_eq!(session.last_search().unwrap().passengers.adults, 2);
    }

    #[test]
    fn new_search_from_filter_panel_keeps_its_constraints() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        session.search(&repo, &criteria()).unwrap();

        let mut filters = session.filter_criteria();
        filters.search.destination = Some(CityInput::Code("LIM".into()));
        filters.allow_layovers = Some(false);
        filters.max_price = Some(700.0);
        let call = session.begin_filter(&filters).unwrap();
        assert!(call.is_search());
        assert_eq!(session.state(), SessionState::Searching);

        let outcome = call.run(&repo);
        let completion = session.complete(call, outcome);
        assert_eq!(completion, Completion::Applied(Notice::found(3)));
        assert_eq!(repo.search_calls(), 2);
        assert_eq!(repo.filter_calls(), 1);
        assert_eq!(session.last_search().unwrap().destination_code(), "LIM");
        assert!(session.search_id().unwrap().starts_with("mock-search-"));
    }

    #[test]
    fn filter_failure_moves_to_filter_failed() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        session.search(&repo, &criteria()).unwrap();
        repo.push_filter_response(Err(ApiError::NotFound));

        let filters = session.filter_criteria();
        session.apply_filters(&repo, &filters).unwrap();
        assert_eq!(session.state(), SessionState::FilterFailed);
        assert_eq!(session.results().len(), 5);
    }

    #[test]
    fn teardown_discards_in_flight_and_blocks_new_calls() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        let states = session.watch_state();
        let call = session.begin_search(&criteria()).unwrap();
        session.teardown();

        let outcome = call.run(&repo);
        assert_eq!(session.complete(call, outcome), Completion::Discarded);
        assert_eq!(session.state(), SessionState::Searching);
        assert_eq!(states.latest(), None);
        assert_eq!(
            session.begin_search(&criteria()).unwrap_err(),
            SubmitError::TornDown
        );
    }

    #[test]
    fn handoff_round_trip_and_redirect() {
        let config = AppConfig::default();
        assert_eq!(
            SearchSession::from_handoff(None, &config).err(),
            Some(Redirect { path: SEARCH_PAGE })
        );

        let repo = FakeFlightRepository::new();
        let mut search_page = session();
        search_page.search(&repo, &criteria()).unwrap();
        let handoff = search_page.handoff();

        let results_page = SearchSession::from_handoff(handoff, &config).unwrap();
        assert_eq!(results_page.state(), SessionState::Results);
        assert_eq!(results_page.search_id(), search_page.search_id());
        assert_eq!(results_page.results().len(), 5);
    }

    #[test]
    fn booking_link_requires_search_and_terms() {
        let repo = FakeFlightRepository::new();
        let mut session = session();
        session.search(&repo, &criteria()).unwrap();
        let ticket = session.results().tickets()[0].clone();
        assert!(session.booking_link(&repo, &ticket).is_ok());

        let mut notices = session.watch_notices();
        let mut no_terms = ticket;
        no_terms.terms_url = None;
        assert_eq!(session.booking_link(&repo, &no_terms), Err(ApiError::NotFound));
        let notice = notices.next_change().flatten().unwrap();
        assert_eq!(notice.severity, Severity::Error);
    }

    #[test]
    fn currency_change_posts_info_notice() {
        let mut session = session();
        let mut notices = session.watch_notices();
        session.set_currency("EUR");
        let notice = notices.next_change().flatten().unwrap();
        assert_eq!(notice.kind, NoticeKind::CurrencyChanged("EUR".into()));
        assert_eq!(notice.lifetime, Duration::from_millis(6000));
        session.set_currency("EUR");
        assert_eq!(notices.next_change(), None);
    }
}
