//! HTTP-backed repository.
//!
//! # Design
//! `HttpFlightRepository` composes the pure pieces: mapper output goes into
//! `PetflyClient::build_*`, the resulting `HttpRequest` is handed to a
//! `Transport`, and the `HttpResponse` goes back through `parse_*`. The
//! transport is the only component that touches the network, so tests swap
//! it for a scripted one.

use std::time::Duration;

use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::client::PetflyClient;
use crate::criteria::{FilterCriteria, SearchCriteria};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::mapper::{map_filter_request, map_search_request, MapperOptions};
use crate::repository::{is_city_query, FlightRepository};
use crate::types::{BookingLink, Breed, City, Currency, SearchResult};

/// Executes one HTTP round-trip.
///
/// Non-2xx statuses are returned as data; only failures that produce no
/// response at all are errors.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `ureq` agent with a global timeout.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = match request.method {
            HttpMethod::Get => decorate(self.agent.get(&request.url), &request).call(),
            HttpMethod::Post => {
                let body = request.body.as_deref().unwrap_or_default();
                decorate(self.agent.post(&request.url), &request).send(body.as_bytes())
            }
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn decorate<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn transport_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout,
        other => ApiError::Transport(other.to_string()),
    }
}

/// The real repository.
pub struct HttpFlightRepository<T> {
    client: PetflyClient,
    transport: T,
}

impl<T: Transport> HttpFlightRepository<T> {
    pub fn new(api_base: &str, booking_base: &str, transport: T) -> Self {
        Self {
            client: PetflyClient::new(api_base, booking_base),
            transport,
        }
    }

    fn call<R>(
        &self,
        endpoint: &'static str,
        request: HttpRequest,
        parse: impl FnOnce(&PetflyClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        debug!(endpoint, url = %request.url, "calling flight api");
        let response = self.transport.execute(request)?;
        debug!(endpoint, status = response.status, "flight api responded");
        parse(&self.client, response)
    }

    fn lookup<R>(
        &self,
        endpoint: &'static str,
        request: HttpRequest,
        parse: impl FnOnce(&PetflyClient, HttpResponse) -> Result<Vec<R>, ApiError>,
    ) -> Vec<R> {
        self.call(endpoint, request, parse).unwrap_or_else(|err| {
            warn!(endpoint, error = %err, "lookup failed, returning no options");
            Vec::new()
        })
    }
}

impl<T: Transport> FlightRepository for HttpFlightRepository<T> {
    fn search_cities(&self, query: &str, limit: usize) -> Vec<City> {
        if !is_city_query(query) {
            return Vec::new();
        }
        let request = self.client.build_search_cities(query.trim(), limit);
        self.lookup("cities", request, PetflyClient::parse_search_cities)
    }

    fn get_currencies(&self) -> Vec<Currency> {
        let request = self.client.build_get_currencies();
        self.lookup("currencies", request, PetflyClient::parse_get_currencies)
    }

    fn get_breeds(&self, pet_type_id: u32) -> Vec<Breed> {
        let request = self.client.build_get_breeds(pet_type_id);
        self.lookup("breeds", request, PetflyClient::parse_get_breeds)
    }

    fn search_flights(
        &self,
        criteria: &SearchCriteria,
        currency: &str,
        locale: &str,
        options: &MapperOptions,
    ) -> Result<SearchResult, ApiError> {
        let body = map_search_request(criteria, currency, locale, options);
        let request = self.client.build_search_flights(&body)?;
        self.call("search", request, PetflyClient::parse_search_flights)
    }

    fn filter_flights(
        &self,
        criteria: &FilterCriteria,
        search_id: &str,
        currency: &str,
        locale: &str,
        options: &MapperOptions,
    ) -> Result<SearchResult, ApiError> {
        let body = map_filter_request(criteria, search_id, currency, locale, options);
        let request = self.client.build_filter_flights(&body)?;
        self.call("filter", request, PetflyClient::parse_filter_flights)
    }

    fn get_booking_link(
        &self,
        search_id: &str,
        terms_url: &str,
    ) -> Result<BookingLink, ApiError> {
        let request = self.client.build_booking_link(search_id, terms_url);
        self.call("booking_link", request, PetflyClient::parse_booking_link)
    }
}
