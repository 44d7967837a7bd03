//! Stateless HTTP request builder and response parser for the flight API.
//!
//! # Design
//! `PetflyClient` holds only its two base URLs (flight API and booking
//! partner) and carries no mutable state between calls. Each endpoint is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. A `Transport` executes
//! the round-trip in between, keeping this module free of I/O.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{BookingLink, BookingLinkResponse, Breed, City, Currency, SearchResult};
use crate::wire::{FilterRequest, SearchRequest};

/// Synchronous, stateless client for the flight API.
#[derive(Debug, Clone)]
pub struct PetflyClient {
    api_base: String,
    booking_base: String,
}

impl PetflyClient {
    pub fn new(api_base: &str, booking_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            booking_base: booking_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn build_search_cities(&self, query: &str, limit: usize) -> HttpRequest {
        HttpRequest::get(format!("{}/cities", self.api_base))
            .with_query("query", query)
            .with_query("limit", limit)
    }

    pub fn build_get_currencies(&self) -> HttpRequest {
        HttpRequest::get(format!("{}/currencies", self.api_base))
    }

    pub fn build_get_breeds(&self, pet_type_id: u32) -> HttpRequest {
        HttpRequest::get(format!("{}/breeds", self.api_base)).with_query("petTypeId", pet_type_id)
    }

    pub fn build_search_flights(&self, request: &SearchRequest) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(request)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::post_json(format!("{}/search", self.api_base), body))
    }

    pub fn build_filter_flights(&self, request: &FilterRequest) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(request)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest::post_json(format!("{}/filter", self.api_base), body))
    }

    /// `terms_url` is the ticket's opaque reference, inserted as-is.
    pub fn build_booking_link(&self, search_id: &str, terms_url: &str) -> HttpRequest {
        HttpRequest::get(format!(
            "{}/flight_searches/{search_id}/clicks/{}.json",
            self.booking_base,
            terms_url.trim_start_matches('/')
        ))
    }

    pub fn parse_search_cities(&self, response: HttpResponse) -> Result<Vec<City>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_currencies(&self, response: HttpResponse) -> Result<Vec<Currency>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_breeds(&self, response: HttpResponse) -> Result<Vec<Breed>, ApiError> {
        parse_json(response)
    }

    pub fn parse_search_flights(&self, response: HttpResponse) -> Result<SearchResult, ApiError> {
        parse_json(response)
    }

    pub fn parse_filter_flights(&self, response: HttpResponse) -> Result<SearchResult, ApiError> {
        parse_json(response)
    }

    pub fn parse_booking_link(&self, response: HttpResponse) -> Result<BookingLink, ApiError> {
        parse_json::<BookingLinkResponse>(response).map(BookingLink::from)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
