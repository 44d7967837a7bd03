//! The flight repository capability set and its factory.
//!
//! # Design
//! Two implementations conform to `FlightRepository`: `HttpFlightRepository`
//! (real API over a `Transport`) and `FakeFlightRepository` (fixtures). The
//! choice is made once, from `AppConfig`, by `build_repository`; nothing
//! downstream inspects which one it got.
//!
//! Lookups (`search_cities`, `get_currencies`, `get_breeds`) fail soft and
//! return an empty list. Flight searches, filters and booking links return
//! `Result` so the session can surface a visible failure.

use serde::Deserialize;
use tracing::info;

use crate::config::AppConfig;
use crate::criteria::{FilterCriteria, SearchCriteria};
use crate::error::ApiError;
use crate::fake::FakeFlightRepository;
use crate::mapper::MapperOptions;
use crate::remote::{HttpFlightRepository, UreqTransport};
use crate::types::{BookingLink, Breed, City, Currency, SearchResult};

/// Autocomplete queries shorter than this never reach the repository.
pub const MIN_CITY_QUERY_LEN: usize = 2;

pub const DEFAULT_CITY_LIMIT: usize = 10;

pub trait FlightRepository: Send + Sync {
    fn search_cities(&self, query: &str, limit: usize) -> Vec<City>;

    fn get_currencies(&self) -> Vec<Currency>;

    fn get_breeds(&self, pet_type_id: u32) -> Vec<Breed>;

    fn search_flights(
        &self,
        criteria: &SearchCriteria,
        currency: &str,
        locale: &str,
        options: &MapperOptions,
    ) -> Result<SearchResult, ApiError>;

    fn filter_flights(
        &self,
        criteria: &FilterCriteria,
        search_id: &str,
        currency: &str,
        locale: &str,
        options: &MapperOptions,
    ) -> Result<SearchResult, ApiError>;

    fn get_booking_link(&self, search_id: &str, terms_url: &str)
        -> Result<BookingLink, ApiError>;
}

/// True when `query` is long enough to be worth a lookup.
pub fn is_city_query(query: &str) -> bool {
    query.trim().chars().count() >= MIN_CITY_QUERY_LEN
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    #[default]
    Fake,
    Http,
}

pub fn build_repository(config: &AppConfig) -> Box<dyn FlightRepository> {
    match config.repository.kind {
        RepositoryKind::Fake => {
            info!("using fake flight repository");
            Box::new(FakeFlightRepository::new())
        }
        RepositoryKind::Http => {
            info!(
                base_url = %config.api.base_url,
                timeout_secs = config.api.timeout_secs,
                "using http flight repository"
            );
            let transport = UreqTransport::new(config.api.timeout());
            Box::new(HttpFlightRepository::new(
                &config.api.base_url,
                &config.api.booking_base_url,
                transport,
            ))
        }
    }
}
