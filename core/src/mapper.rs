//! Pure mapping from form criteria to wire requests.
//!
//! # Design
//! Both mappers are deterministic: the only environmental input, "today",
//! travels in `MapperOptions`. With `use_defaults` off, anything the user has
//! not filled in maps to an empty or zero wire value, which callers treat as
//! "incomplete, do not search". With it on, fixed fallbacks from
//! `MapperDefaults` stand in so a best-effort search can still run.

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::criteria::{
    Certificate, FilterCriteria, PetType, SearchCriteria, TravelClass, ADULT_PET_AGE_WEEKS,
    INFANT_MAX_AGE,
};
use crate::wire::{
    Dimensions, FilterParameters, FilterRequest, PassengerCounts, SearchRequest, Segment,
};

/// Sentinel meaning "any" for airline and certificate filters.
pub const DEFAULT_CODE_ALL: &str = "all";

const FALLBACK_FILTER_CURRENCY: &str = "COP";
const FALLBACK_PET_TYPE: &str = "Dog";
const FALLBACK_TRIP_CLASS: &str = "Y";

/// Whether filter-only fields are always sent or only when set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterRequestMode {
    #[default]
    Dense,
    Sparse,
}

/// Fallback values used when `use_defaults` is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperDefaults {
    pub origin: String,
    pub destination: String,
    pub weight_kg: f64,
    pub breed: String,
    pub pet_type: PetType,
    /// Days after "today" used as departure when none was chosen.
    pub departure_offset_days: u64,
    pub filter_mode: FilterRequestMode,
}

impl Default for MapperDefaults {
    fn default() -> Self {
        Self {
            origin: "BOG".to_string(),
            destination: "MAD".to_string(),
            weight_kg: 5.0,
            breed: "Mixed".to_string(),
            pet_type: PetType::Dog,
            departure_offset_days: 14,
            filter_mode: FilterRequestMode::Dense,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapperOptions {
    pub use_defaults: bool,
    pub today: NaiveDate,
    pub defaults: MapperDefaults,
}

impl MapperOptions {
    /// Missing fields map to empty values.
    pub fn strict() -> Self {
        Self {
            use_defaults: false,
            today: Utc::now().date_naive(),
            defaults: MapperDefaults::default(),
        }
    }

    /// Missing fields are filled from `MapperDefaults`.
    pub fn with_defaults() -> Self {
        Self {
            use_defaults: true,
            ..Self::strict()
        }
    }

    pub fn on(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn using(mut self, defaults: MapperDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Build the `POST /search` body.
pub fn map_search_request(
    criteria: &SearchCriteria,
    currency: &str,
    locale: &str,
    options: &MapperOptions,
) -> SearchRequest {
    let defaults = &options.defaults;
    let fill = options.use_defaults;

    let origin = text_or(criteria.origin_code(), fill.then_some(defaults.origin.as_str()));
    let destination = text_or(
        criteria.destination_code(),
        fill.then_some(defaults.destination.as_str()),
    );
    let origin_country = country_of(criteria.origin_city.as_ref());
    let destination_country = country_of(criteria.destination_city.as_ref());

    let departure = criteria.departure_date.or_else(|| {
        fill.then(|| {
            options
                .today
                .checked_add_days(Days::new(defaults.departure_offset_days))
        })
        .flatten()
    });

    let mut segments = Vec::with_capacity(2);
    if let Some(date) = departure {
        segments.push(Segment {
            origin: origin.clone(),
            origin_country: origin_country.clone(),
            destination: destination.clone(),
            destination_country: destination_country.clone(),
            date,
        });
    }
    if criteria.is_round_trip() {
        if let Some(date) = criteria.return_date {
            segments.push(Segment {
                origin: destination,
                origin_country: destination_country,
                destination: origin,
                destination_country: origin_country,
                date,
            });
        }
    }

    // Pet sub-fields only count while the pet flag is on.
    let pet = criteria.has_pet;
    let age = match criteria.pet_age_weeks.filter(|_| pet) {
        Some(age) => age.min(ADULT_PET_AGE_WEEKS),
        None if fill => ADULT_PET_AGE_WEEKS,
        None => 0,
    };
    let weight = criteria
        .pet_weight_kg
        .filter(|w| pet && w.is_finite() && *w > 0.0)
        .or_else(|| fill.then_some(defaults.weight_kg))
        .map(round_weight)
        .unwrap_or(0.0);
    let breed = text_or(
        criteria.pet_breed.as_deref().filter(|_| pet).unwrap_or(""),
        fill.then_some(defaults.breed.as_str()),
    );
    let pet_type = criteria
        .pet_type
        .filter(|_| pet)
        .and_then(pet_type_code)
        .or_else(|| fill.then(|| pet_type_code(defaults.pet_type).unwrap_or(FALLBACK_PET_TYPE)))
        .unwrap_or("")
        .to_string();

    SearchRequest {
        age,
        weight,
        breed,
        currency: currency.to_string(),
        pet_type,
        locale: locale.to_string(),
        trip_class: trip_class_code(criteria.passengers.travel_class).to_string(),
        passengers: passenger_counts(criteria),
        segments,
    }
}

/// Build the `POST /filter` body for the search identified by `search_id`.
pub fn map_filter_request(
    criteria: &FilterCriteria,
    search_id: &str,
    currency: &str,
    locale: &str,
    options: &MapperOptions,
) -> FilterRequest {
    let base = map_search_request(&criteria.search, currency, locale, options);
    let dense = options.defaults.filter_mode == FilterRequestMode::Dense;

    let dims = criteria.crate_dimensions;
    let any_dimension = [dims.length, dims.width, dims.height]
        .iter()
        .any(|d| number(*d).is_some());
    let dimensions = (dense || any_dimension).then(|| Dimensions {
        length: number(dims.length).unwrap_or(0.0),
        width: number(dims.width).unwrap_or(0.0),
        height: number(dims.height).unwrap_or(0.0),
    });

    let filter_parameters = FilterParameters {
        is_direct: criteria
            .allow_layovers
            .map(|allow| !allow)
            .or(dense.then_some(false)),
        min_price: number(criteria.min_price).or(dense.then_some(0.0)),
        max_price: number(criteria.max_price).or(dense.then_some(0.0)),
        dimensions,
        airline_code: non_blank(criteria.airline.as_deref())
            .map(str::to_string)
            .or_else(|| dense.then(|| DEFAULT_CODE_ALL.to_string())),
        certificate_type: criteria
            .certificates
            .first()
            .map(certificate_code)
            .or_else(|| dense.then(|| DEFAULT_CODE_ALL.to_string())),
        is_carrier_required: criteria.no_carrier_required.map(|none_needed| !none_needed),
    };

    FilterRequest {
        search_id: search_id.to_string(),
        filter_parameters,
        age: base.age.min(ADULT_PET_AGE_WEEKS),
        weight: base.weight,
        breed: non_blank(Some(&base.breed)).map(str::to_string),
        currency: non_blank(Some(&base.currency))
            .unwrap_or(FALLBACK_FILTER_CURRENCY)
            .to_string(),
        pet_type: non_blank(Some(&base.pet_type))
            .unwrap_or(FALLBACK_PET_TYPE)
            .to_string(),
        locale: non_blank(Some(&base.locale)).map(str::to_string),
        trip_class: non_blank(Some(&base.trip_class))
            .unwrap_or(FALLBACK_TRIP_CLASS)
            .to_string(),
        passengers: base.passengers,
        segments: base.segments,
    }
}

pub fn trip_class_code(class: TravelClass) -> &'static str {
    match class {
        TravelClass::Economy => "Y",
        TravelClass::Business => "C",
        TravelClass::Unknown => FALLBACK_TRIP_CLASS,
    }
}

pub fn pet_type_code(pet: PetType) -> Option<&'static str> {
    match pet {
        PetType::Dog => Some("Dog"),
        PetType::Cat => Some("Cat"),
        PetType::Unknown => None,
    }
}

pub fn certificate_code(certificate: &Certificate) -> String {
    match certificate {
        Certificate::EmotionalSupport => "AE".to_string(),
        Certificate::Service => "PS".to_string(),
        Certificate::Other(raw) => raw.clone(),
    }
}

/// Split child ages into `children` and `infants` (age <= 2).
pub fn passenger_counts(criteria: &SearchCriteria) -> PassengerCounts {
    let ages = &criteria.passengers.children_ages;
    let infants = ages.iter().filter(|age| **age <= INFANT_MAX_AGE).count() as u32;
    PassengerCounts {
        adults: criteria.passengers.adults,
        children: ages.len() as u32 - infants,
        infants,
    }
}

fn round_weight(weight: f64) -> f64 {
    (weight * 10.0).round() / 10.0
}

fn text_or(value: &str, fallback: Option<&str>) -> String {
    non_blank(Some(value))
        .or(fallback)
        .unwrap_or("")
        .to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn number(value: Option<f64>) -> Option<f64> {
    value.filter(|n| n.is_finite())
}

fn country_of(city: Option<&crate::types::City>) -> Option<String> {
    city.and_then(|c| non_blank(Some(&c.country_code)))
        .map(str::to_string)
}
