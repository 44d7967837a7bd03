//! Response entities returned by the flight API.
//!
//! # Design
//! Field names follow the remote JSON (camelCase) via serde renames. Optional
//! price bands are `Option` because absence means "not offered", never zero.

use serde::{Deserialize, Serialize};

/// A city returned by the autocomplete lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub city_name: String,
    pub city_code: String,
    pub country_code: String,
    pub country_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Breed {
    pub name: String,
    pub pet_type_id: u32,
}

/// A currency as listed by `GET /currencies`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Currency {
    pub id: u32,
    pub name: String,
    pub symbol: String,
}

/// Result of `POST /search` and `POST /filter`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_id: Option<String>,
    #[serde(default)]
    pub flight_tickets: Vec<FlightTicket>,
    #[serde(default)]
    pub filters_boundary: FiltersBoundary,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.flight_tickets.is_empty()
    }
}

/// One priced, bookable combination of flight groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightTicket {
    pub flights: Vec<FlightGroup>,
    #[serde(default)]
    pub max_stops: u32,
    #[serde(default)]
    pub max_stop_duration: u32,
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub is_direct: bool,
    /// Manual-review pet price band.
    #[serde(default)]
    pub mr_price: Option<PriceRange>,
    /// Emotional-support animal price band.
    #[serde(default)]
    pub ae_price: Option<PriceRange>,
    /// Service animal price band.
    #[serde(default)]
    pub ps_price: Option<PriceRange>,
    /// Total including pet fees. `min <= max` when present.
    #[serde(default)]
    pub total: Option<PriceRange>,
    /// Opaque reference passed back to the booking-link endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_url: Option<String>,
}

impl FlightTicket {
    /// Sum of every leg's duration across outbound and return, in minutes.
    pub fn total_duration(&self) -> u32 {
        self.flights
            .iter()
            .flat_map(|group| group.flight_items.iter())
            .map(|leg| leg.duration)
            .sum()
    }

    pub fn is_round_trip(&self) -> bool {
        self.flights.len() > 1
    }
}

/// Outbound or return portion of a ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightGroup {
    pub flight_items: Vec<FlightLeg>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightLeg {
    pub airline_name: String,
    pub airline_code: String,
    pub departure: String,
    pub departure_time: String,
    pub arrival: String,
    pub arrival_time: String,
    /// Minutes.
    #[serde(default)]
    pub duration: u32,
    pub trip_class: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

/// Bounds the filter panel uses to size its sliders and airline list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FiltersBoundary {
    pub flights_duration: DurationRange,
    pub stops_duration: DurationRange,
    pub price: PriceBoundary,
    pub airlines: Vec<Airline>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DurationRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceBoundary {
    pub min: f64,
    pub max: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Airline {
    pub name: String,
    pub iata: String,
}

/// Raw payload of the booking-link endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingLinkResponse {
    pub params: serde_json::Map<String, serde_json::Value>,
    pub method: String,
    pub url: String,
    pub gate_id: u64,
    pub click_id: u64,
}

/// Where to send the user to complete a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingLink {
    pub params: serde_json::Map<String, serde_json::Value>,
    pub method: String,
    pub url: String,
    pub gate_id: u64,
    pub click_id: u64,
}

impl From<BookingLinkResponse> for BookingLink {
    fn from(raw: BookingLinkResponse) -> Self {
        Self {
            params: raw.params,
            method: raw.method,
            url: raw.url,
            gate_id: raw.gate_id,
            click_id: raw.click_id,
        }
    }
}
