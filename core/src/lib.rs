//! Client core for the pet-friendly flight search service.
//!
//! # Overview
//! Turns the search and filter forms into wire requests, talks to the flight
//! API through a repository, and keeps the client-side view of the results:
//! sorting, "load more" pagination, and the decision between a new search
//! and a cheaper filter of the current one.
//!
//! # Design
//! - Mapping, validation, ordering and change detection are pure functions
//!   over plain data, testable without I/O.
//! - `PetflyClient` follows the host-does-IO split: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`, and a `Transport`
//!   performs the round-trip in between.
//! - `FlightRepository` has a real and a fake implementation, selected by
//!   `AppConfig` through `build_repository`.
//! - `SearchSession` owns the result set and the search/filter state
//!   machine, and guards against stale responses and late completions.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod change;
pub mod client;
pub mod config;
pub mod criteria;
pub mod error;
pub mod fake;
pub mod http;
pub mod mapper;
pub mod ordering;
pub mod preferences;
pub mod remote;
pub mod repository;
pub mod session;
pub mod stream;
pub mod types;
pub mod validation;
pub mod wire;

pub use change::{decide_refresh, ChangeSet, RefreshAction, SearchSnapshot};
pub use client::PetflyClient;
pub use config::AppConfig;
pub use criteria::{
    Certificate, CityInput, FilterCriteria, PassengerSelection, PetType, SearchCriteria,
    TravelClass, TripType,
};
pub use error::{ApiError, PreferenceError};
pub use fake::FakeFlightRepository;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mapper::{map_filter_request, map_search_request, MapperDefaults, MapperOptions};
pub use ordering::{ResultsView, SortDirection, SortKey, SortState};
pub use preferences::{CurrencyService, LanguageService, PreferenceStore};
pub use remote::{HttpFlightRepository, Transport, UreqTransport};
pub use repository::{build_repository, FlightRepository, RepositoryKind};
pub use session::{
    Completion, Notice, PendingCall, Redirect, ResultsHandoff, SearchSession, SessionState,
};
pub use stream::{StateStream, Subscription, Teardown};
pub use types::{BookingLink, Breed, City, Currency, FlightTicket, SearchResult};
pub use validation::{validate, FormConfig, ValidationError};
pub use wire::{FilterRequest, SearchRequest};
