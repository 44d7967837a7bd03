//! Local stand-in for the flight API and the booking-link endpoint.
//!
//! Searches are stored in memory under a fresh `searchId` so `/filter` can
//! narrow them later. A search whose first segment departs from `ERR`
//! answers 503, which lets clients exercise their failure paths.

mod fixtures;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub use fixtures::{breeds, cities, currencies};

/// Origin code that makes `/search` fail with 503.
pub const FAILING_ORIGIN: &str = "ERR";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub city_name: String,
    pub city_code: String,
    pub country_code: String,
    pub country_name: String,
    pub display_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Currency {
    pub id: u32,
    pub name: String,
    pub symbol: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Breed {
    pub name: String,
    pub pet_type_id: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub origin: String,
    #[serde(default)]
    pub origin_country: Option<String>,
    pub destination: String,
    #[serde(default)]
    pub destination_country: Option<String>,
    pub date: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub currency: String,
    pub trip_class: String,
    pub segments: Vec<Segment>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParameters {
    pub is_direct: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub airline_code: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBody {
    pub search_id: String,
    #[serde(default)]
    pub filter_parameters: FilterParameters,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub airline_name: String,
    pub airline_code: String,
    pub departure: String,
    pub departure_time: String,
    pub arrival: String,
    pub arrival_time: String,
    pub duration: u32,
    pub trip_class: String,
    pub image_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightGroup {
    pub flight_items: Vec<Leg>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub flights: Vec<FlightGroup>,
    pub max_stops: u32,
    pub max_stop_duration: u32,
    pub price: f64,
    pub currency: String,
    pub is_direct: bool,
    pub mr_price: Option<PriceRange>,
    pub ae_price: Option<PriceRange>,
    pub ps_price: Option<PriceRange>,
    pub total: Option<PriceRange>,
    pub terms_url: String,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MinutesRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Airline {
    pub name: String,
    pub iata: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Boundary {
    pub flights_duration: MinutesRange,
    pub stops_duration: MinutesRange,
    pub price: PriceBounds,
    pub airlines: Vec<Airline>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_id: String,
    pub flight_tickets: Vec<Ticket>,
    pub filters_boundary: Boundary,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BookingLink {
    pub params: HashMap<String, String>,
    pub method: String,
    pub url: String,
    pub gate_id: u64,
    pub click_id: u64,
}

#[derive(Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreedQuery {
    pub pet_type_id: u32,
}

pub type Searches = Arc<RwLock<HashMap<String, Vec<Ticket>>>>;

pub fn app() -> Router {
    let searches: Searches = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/cities", get(search_cities))
        .route("/currencies", get(list_currencies))
        .route("/breeds", get(list_breeds))
        .route("/search", post(search_flights))
        .route("/filter", post(filter_flights))
        .route(
            "/flight_searches/{search_id}/clicks/{click}",
            get(booking_link),
        )
        .with_state(searches)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock flight api listening");
    }
    axum::serve(listener, app()).await
}

async fn search_cities(Query(params): Query<CityQuery>) -> Json<Vec<City>> {
    let needle = params.query.trim().to_lowercase();
    let limit = params.limit.unwrap_or(10);
    let found = cities()
        .into_iter()
        .filter(|c| {
            !needle.is_empty()
                && (c.city_name.to_lowercase().contains(&needle)
                    || c.city_code.to_lowercase().contains(&needle)
                    || c.country_name.to_lowercase().contains(&needle))
        })
        .take(limit)
        .collect();
    Json(found)
}

async fn list_currencies() -> Json<Vec<Currency>> {
    Json(currencies())
}

async fn list_breeds(Query(params): Query<BreedQuery>) -> Json<Vec<Breed>> {
    Json(breeds(params.pet_type_id))
}

async fn search_flights(
    State(searches): State<Searches>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let Some(outbound) = body.segments.first() else {
        return Err((StatusCode::BAD_REQUEST, "at least one segment is required".into()));
    };
    if outbound.origin == FAILING_ORIGIN {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable".into()));
    }
    let tickets = fixtures::tickets(
        outbound,
        body.segments.get(1),
        &body.currency,
        &body.trip_class,
    );
    let search_id = Uuid::new_v4().to_string();
    debug!(%search_id, count = tickets.len(), "search stored");
    searches
        .write()
        .await
        .insert(search_id.clone(), tickets.clone());
    Ok(Json(response(search_id, tickets)))
}

async fn filter_flights(
    State(searches): State<Searches>,
    Json(body): Json<FilterBody>,
) -> Result<Json<SearchResponse>, StatusCode> {
    let searches = searches.read().await;
    let stored = searches.get(&body.search_id).ok_or(StatusCode::NOT_FOUND)?;
    let params = &body.filter_parameters;
    let tickets: Vec<Ticket> = stored
        .iter()
        .filter(|t| matches_filters(t, params))
        .cloned()
        .collect();
    debug!(search_id = %body.search_id, count = tickets.len(), "filter applied");
    Ok(Json(response(body.search_id.clone(), tickets)))
}

async fn booking_link(
    State(searches): State<Searches>,
    Path((search_id, click)): Path<(String, String)>,
) -> Result<Json<BookingLink>, StatusCode> {
    let terms = click.strip_suffix(".json").ok_or(StatusCode::NOT_FOUND)?;
    let searches = searches.read().await;
    let stored = searches.get(&search_id).ok_or(StatusCode::NOT_FOUND)?;
    if !stored.iter().any(|t| t.terms_url == terms) {
        return Err(StatusCode::NOT_FOUND);
    }
    let params = HashMap::from([
        ("search_id".to_string(), search_id.clone()),
        ("terms".to_string(), terms.to_string()),
    ]);
    Ok(Json(BookingLink {
        params,
        method: "GET".to_string(),
        url: format!("https://booking.example.com/redirect/{terms}"),
        gate_id: 125,
        click_id: terms.parse().unwrap_or(0),
    }))
}

/// `maxPrice` of 0 means no upper bound; airline `all` matches anything.
pub fn matches_filters(ticket: &Ticket, params: &FilterParameters) -> bool {
    if params.is_direct == Some(true) && !ticket.is_direct {
        return false;
    }
    if let Some(min) = params.min_price {
        if ticket.price < min {
            return false;
        }
    }
    if let Some(max) = params.max_price.filter(|max| *max > 0.0) {
        if ticket.price > max {
            return false;
        }
    }
    match params.airline_code.as_deref() {
        None | Some("") | Some("all") => true,
        Some(code) => ticket
            .flights
            .iter()
            .flat_map(|g| &g.flight_items)
            .any(|leg| leg.airline_code == code),
    }
}

fn response(search_id: String, tickets: Vec<Ticket>) -> SearchResponse {
    SearchResponse {
        search_id,
        filters_boundary: fixtures::boundary(&tickets),
        flight_tickets: tickets,
    }
}
