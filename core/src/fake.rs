//! In-memory repository with fixture data.
//!
//! Used when `repository.kind = "fake"` and by session tests. Responses for
//! `search_flights` / `filter_flights` can be scripted; when the script is
//! empty the fixtures below answer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::criteria::{FilterCriteria, SearchCriteria};
use crate::error::ApiError;
use crate::mapper::{map_filter_request, map_search_request, MapperOptions};
use crate::repository::{is_city_query, FlightRepository};
use crate::types::{
    Airline, BookingLink, Breed, City, Currency, DurationRange, FiltersBoundary, FlightGroup,
    FlightLeg, FlightTicket, PriceBoundary, PriceRange, SearchResult,
};
use crate::wire::Segment;

/// Number of fixture tickets a filter call returns.
const FILTERED_TICKETS: usize = 3;

type Scripted = Mutex<VecDeque<Result<SearchResult, ApiError>>>;

#[derive(Default)]
pub struct FakeFlightRepository {
    search_script: Scripted,
    filter_script: Scripted,
    search_calls: AtomicUsize,
    filter_calls: AtomicUsize,
}

impl FakeFlightRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next `search_flights` call.
    pub fn push_search_response(&self, response: Result<SearchResult, ApiError>) {
        queue(&self.search_script).push_back(response);
    }

    /// Queue the answer for the next `filter_flights` call.
    pub fn push_filter_response(&self, response: Result<SearchResult, ApiError>) {
        queue(&self.filter_script).push_back(response);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn filter_calls(&self) -> usize {
        self.filter_calls.load(Ordering::SeqCst)
    }
}

fn queue(script: &Scripted) -> MutexGuard<'_, VecDeque<Result<SearchResult, ApiError>>> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next_scripted(script: &Scripted) -> Option<Result<SearchResult, ApiError>> {
    queue(script).pop_front()
}

impl FlightRepository for FakeFlightRepository {
    fn search_cities(&self, query: &str, limit: usize) -> Vec<City> {
        if !is_city_query(query) {
            return Vec::new();
        }
        let needle = query.trim().to_lowercase();
        fixture_cities()
            .into_iter()
            .filter(|city| {
                city.city_name.to_lowercase().contains(&needle)
                    || city.city_code.to_lowercase().contains(&needle)
                    || city.country_name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }

    fn get_currencies(&self) -> Vec<Currency> {
        vec![
            currency(1, "USD", "$"),
            currency(2, "EUR", "€"),
            currency(3, "COP", "$"),
            currency(4, "MXN", "$"),
        ]
    }

    fn get_breeds(&self, pet_type_id: u32) -> Vec<Breed> {
        let names: &[&str] = match pet_type_id {
            1 => &[
                "Mixed",
                "Labrador Retriever",
                "Golden Retriever",
                "French Bulldog",
                "Chihuahua",
            ],
            2 => &["Mixed", "Persian", "Siamese", "Maine Coon"],
            _ => &[],
        };
        names
            .iter()
            .map(|name| Breed {
                name: (*name).to_string(),
                pet_type_id,
            })
            .collect()
    }

    fn search_flights(
        &self,
        criteria: &SearchCriteria,
        currency: &str,
        locale: &str,
        options: &MapperOptions,
    ) -> Result<SearchResult, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = next_scripted(&self.search_script) {
            return scripted;
        }
        let request = map_search_request(criteria, currency, locale, options);
        let Some(outbound) = request.segments.first() else {
            debug!("fake search without segments, returning no tickets");
            return Ok(SearchResult::default());
        };
        let tickets = fixture_tickets(outbound, request.segments.get(1), &request.currency);
        Ok(SearchResult {
            search_id: Some(format!("mock-search-{}", Uuid::new_v4())),
            filters_boundary: boundary_of(&tickets),
            flight_tickets: tickets,
        })
    }

    fn filter_flights(
        &self,
        criteria: &FilterCriteria,
        search_id: &str,
        currency: &str,
        locale: &str,
        options: &MapperOptions,
    ) -> Result<SearchResult, ApiError> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = next_scripted(&self.filter_script) {
            return scripted;
        }
        let request = map_filter_request(criteria, search_id, currency, locale, options);
        let Some(outbound) = request.segments.first() else {
            return Ok(SearchResult {
                search_id: Some(search_id.to_string()),
                ..SearchResult::default()
            });
        };
        let mut tickets = fixture_tickets(outbound, request.segments.get(1), &request.currency);
        tickets.truncate(FILTERED_TICKETS);
        Ok(SearchResult {
            search_id: Some(search_id.to_string()),
            filters_boundary: boundary_of(&tickets),
            flight_tickets: tickets,
        })
    }

    fn get_booking_link(
        &self,
        search_id: &str,
        terms_url: &str,
    ) -> Result<BookingLink, ApiError> {
        if search_id.is_empty() || terms_url.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut params = serde_json::Map::new();
        params.insert("search_id".into(), search_id.into());
        params.insert("terms".into(), terms_url.into());
        Ok(BookingLink {
            params,
            method: "GET".to_string(),
            url: format!("https://booking.example.com/redirect/{terms_url}"),
            gate_id: 125,
            click_id: 1_000_001,
        })
    }
}

fn currency(id: u32, name: &str, symbol: &str) -> Currency {
    Currency {
        id,
        name: name.to_string(),
        symbol: symbol.to_string(),
    }
}

fn city(name: &str, code: &str, country_code: &str, country: &str) -> City {
    City {
        city_name: name.to_string(),
        city_code: code.to_string(),
        country_code: country_code.to_string(),
        country_name: country.to_string(),
        display_name: format!("{name}, {country} ({code})"),
    }
}

fn fixture_cities() -> Vec<City> {
    vec![
        city("Bogotá", "BOG", "CO", "Colombia"),
        city("Medellín", "MDE", "CO", "Colombia"),
        city("Cali", "CLO", "CO", "Colombia"),
        city("Cartagena", "CTG", "CO", "Colombia"),
        city("Barranquilla", "BAQ", "CO", "Colombia"),
        city("Buenos Aires", "BUE", "AR", "Argentina"),
        city("Lima", "LIM", "PE", "Perú"),
        city("Santiago", "SCL", "CL", "Chile"),
        city("Madrid", "MAD", "ES", "España"),
    ]
}

/// (airline name, code, price, outbound leg minutes, pet fee)
const FIXTURE_FARES: [(&str, &str, f64, &[u32], f64); 5] = [
    ("Air Europa", "UX", 715.0, &[240, 420], 120.0),
    ("Avianca", "AV", 450.0, &[630], 90.0),
    ("LATAM", "LA", 890.0, &[180, 500], 150.0),
    ("Copa Airlines", "CM", 620.0, &[200, 460], 110.0),
    ("Iberia", "IB", 550.0, &[600], 100.0),
];

fn fixture_tickets(
    outbound: &Segment,
    inbound: Option<&Segment>,
    currency: &str,
) -> Vec<FlightTicket> {
    FIXTURE_FARES
        .iter()
        .enumerate()
        .map(|(i, (name, code, price, legs, pet_fee))| {
            let mut flights = vec![group(name, code, outbound, legs)];
            if let Some(inbound) = inbound {
                flights.push(group(name, code, inbound, legs));
            }
            let max_stops = legs.len() as u32 - 1;
            let total = price + pet_fee;
            FlightTicket {
                flights,
                max_stops,
                max_stop_duration: if max_stops > 0 { 95 } else { 0 },
                price: *price,
                currency: currency.to_string(),
                is_direct: max_stops == 0,
                mr_price: Some(band(*pet_fee, currency)),
                ae_price: (i % 2 == 0).then(|| band(pet_fee * 0.5, currency)),
                ps_price: Some(band(0.0, currency)),
                total: Some(PriceRange {
                    min: total,
                    max: total + 40.0,
                    currency: currency.to_string(),
                }),
                terms_url: Some((7_000 + i).to_string()),
            }
        })
        .collect()
}

fn band(amount: f64, currency: &str) -> PriceRange {
    PriceRange {
        min: amount,
        max: amount,
        currency: currency.to_string(),
    }
}

fn group(airline: &str, code: &str, segment: &Segment, legs: &[u32]) -> FlightGroup {
    let date = segment.date;
    let hub = "PTY";
    let flight_items = legs
        .iter()
        .enumerate()
        .map(|(i, minutes)| {
            let from = if i == 0 { segment.origin.as_str() } else { hub };
            let to = if i + 1 == legs.len() {
                segment.destination.as_str()
            } else {
                hub
            };
            FlightLeg {
                airline_name: airline.to_string(),
                airline_code: code.to_string(),
                departure: from.to_string(),
                departure_time: timestamp(date, 8 + 2 * i as u32),
                arrival: to.to_string(),
                arrival_time: timestamp(date, 8 + 2 * i as u32 + minutes / 60),
                duration: *minutes,
                trip_class: "Economy".to_string(),
                image_url: format!("https://pics.avs.io/200/200/{code}.png"),
            }
        })
        .collect();
    FlightGroup { flight_items }
}

fn timestamp(date: NaiveDate, hour: u32) -> String {
    let days = hour / 24;
    let date = date
        .checked_add_days(chrono::Days::new(u64::from(days)))
        .unwrap_or(date);
    format!("{}T{:02}:00:00", date.format("%Y-%m-%d"), hour % 24)
}

fn boundary_of(tickets: &[FlightTicket]) -> FiltersBoundary {
    let durations = tickets.iter().map(FlightTicket::total_duration);
    let prices: Vec<f64> = tickets.iter().map(|t| t.price).collect();
    let mut airlines: Vec<Airline> = Vec::new();
    for leg in tickets
        .iter()
        .flat_map(|t| t.flights.iter())
        .flat_map(|g| g.flight_items.iter())
    {
        if !airlines.iter().any(|a| a.iata == leg.airline_code) {
            airlines.push(Airline {
                name: leg.airline_name.clone(),
                iata: leg.airline_code.clone(),
            });
        }
    }
    FiltersBoundary {
        flights_duration: DurationRange {
            min: durations.clone().min().unwrap_or(0),
            max: durations.max().unwrap_or(0),
        },
        stops_duration: DurationRange {
            min: 0,
            max: tickets.iter().map(|t| t.max_stop_duration).max().unwrap_or(0),
        },
        price: PriceBoundary {
            min: prices.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max: prices.iter().copied().reduce(f64::max).unwrap_or(0.0),
            currency: tickets.first().map(|t| t.currency.clone()),
        },
        airlines,
    }
}
