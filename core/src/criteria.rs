//! In-memory form model for search and filter criteria.
//!
//! # Design
//! `SearchCriteria` is what the search page edits; `FilterCriteria` wraps it
//! with the filter panel's extra constraints. Every filter field is optional:
//! `None` means "no constraint", never zero. The mutators here reproduce the
//! form's coupled-field behavior (return date bump, adult-age toggle,
//! autocomplete selection) so callers never patch related fields by hand.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::City;

/// Age (in weeks) at which a pet counts as adult.
pub const ADULT_PET_AGE_WEEKS: u32 = 24;

/// Children at or below this age travel as infants.
pub const INFANT_MAX_AGE: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripType {
    #[serde(rename = "oneway")]
    OneWay,
    #[default]
    #[serde(rename = "roundtrip")]
    RoundTrip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelClass {
    #[default]
    Economy,
    Business,
    /// Anything the form produced that the API has no code for.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    Dog,
    Cat,
    #[serde(other)]
    Unknown,
}

impl PetType {
    /// Identifier used by the breeds lookup.
    pub fn id(self) -> Option<u32> {
        match self {
            PetType::Dog => Some(1),
            PetType::Cat => Some(2),
            PetType::Unknown => None,
        }
    }
}

/// A city field as the form holds it: either a bare code typed by the user
/// or the `{label, value}` object produced by the autocomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CityInput {
    Code(String),
    Selection(CitySelection),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySelection {
    #[serde(default)]
    pub label: String,
    pub value: String,
}

impl CityInput {
    pub fn code(&self) -> &str {
        match self {
            CityInput::Code(code) => code.trim(),
            CityInput::Selection(selection) => selection.value.trim(),
        }
    }
}

/// Extract the city code from an optional form field, `""` when unset.
pub fn city_code(input: Option<&CityInput>) -> &str {
    input.map(CityInput::code).unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerSelection {
    pub adults: u32,
    pub children: u32,
    #[serde(default)]
    pub children_ages: Vec<u32>,
    #[serde(default)]
    pub travel_class: TravelClass,
}

impl Default for PassengerSelection {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            children_ages: Vec::new(),
            travel_class: TravelClass::Economy,
        }
    }
}

/// The search page's form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    pub trip_type: TripType,
    pub origin: Option<CityInput>,
    pub origin_city: Option<City>,
    pub destination: Option<CityInput>,
    pub destination_city: Option<City>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: PassengerSelection,
    pub has_pet: bool,
    pub pet_type: Option<PetType>,
    pub pet_age_weeks: Option<u32>,
    pub pet_weight_kg: Option<f64>,
    pub pet_breed: Option<String>,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            trip_type: TripType::RoundTrip,
            origin: None,
            origin_city: None,
            destination: None,
            destination_city: None,
            departure_date: None,
            return_date: None,
            passengers: PassengerSelection::default(),
            has_pet: true,
            pet_type: None,
            pet_age_weeks: None,
            pet_weight_kg: None,
            pet_breed: None,
        }
    }
}

impl SearchCriteria {
    pub fn origin_code(&self) -> &str {
        city_code(self.origin.as_ref())
    }

    pub fn destination_code(&self) -> &str {
        city_code(self.destination.as_ref())
    }

    /// Apply an autocomplete pick to the origin field.
    pub fn select_origin(&mut self, city: City) {
        self.origin = Some(selection_for(&city));
        self.origin_city = Some(city);
    }

    pub fn select_destination(&mut self, city: City) {
        self.destination = Some(selection_for(&city));
        self.destination_city = Some(city);
    }

    /// Set the departure date, pushing the return date to the following day
    /// when it would otherwise fall on or before departure.
    pub fn set_departure_date(&mut self, date: Option<NaiveDate>) {
        self.departure_date = date;
        if let (Some(departure), Some(ret)) = (date, self.return_date) {
            if departure >= ret {
                self.return_date = departure.checked_add_days(Days::new(1));
            }
        }
    }

    /// The "older than 24 weeks" toggle: `Some(true)` pins the age to the
    /// adult sentinel, `Some(false)` clears it for the user to enter.
    pub fn set_pet_age_over_24_weeks(&mut self, over: Option<bool>) {
        match over {
            Some(true) => self.pet_age_weeks = Some(ADULT_PET_AGE_WEEKS),
            Some(false) => self.pet_age_weeks = None,
            None => {}
        }
    }

    pub fn is_round_trip(&self) -> bool {
        self.trip_type == TripType::RoundTrip
    }
}

fn selection_for(city: &City) -> CityInput {
    CityInput::Selection(CitySelection {
        label: city.display_name.clone(),
        value: city.city_code.clone(),
    })
}

/// Accepted assistance-animal certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Certificate {
    EmotionalSupport,
    Service,
    Other(String),
}

impl From<String> for Certificate {
    fn from(value: String) -> Self {
        match value.as_str() {
            "emotional" => Certificate::EmotionalSupport,
            "service" => Certificate::Service,
            _ => Certificate::Other(value),
        }
    }
}

impl From<Certificate> for String {
    fn from(value: Certificate) -> Self {
        match value {
            Certificate::EmotionalSupport => "emotional".to_string(),
            Certificate::Service => "service".to_string(),
            Certificate::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CrateDimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// The results page's filter panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    #[serde(flatten)]
    pub search: SearchCriteria,
    pub crate_dimensions: CrateDimensions,
    pub no_carrier_required: Option<bool>,
    pub certificates: Vec<Certificate>,
    pub allow_layovers: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub airline: Option<String>,
}

impl FilterCriteria {
    /// Seed the filter panel from the search that produced the results.
    /// The adult-age sentinel is shown as unset, matching the toggle.
    pub fn seeded_from(search: &SearchCriteria) -> Self {
        let mut search = search.clone();
        search.pet_age_weeks = match search.pet_age_weeks {
            Some(age) if age >= ADULT_PET_AGE_WEEKS => None,
            other => other,
        };
        Self {
            search,
            ..Self::default()
        }
    }

    /// True when any filter-only constraint narrows the result set.
    pub fn has_constraints(&self) -> bool {
        let dims = self.crate_dimensions;
        dims.length.is_some()
            || dims.width.is_some()
            || dims.height.is_some()
            || self.no_carrier_required.is_some()
            || !self.certificates.is_empty()
            || self.allow_layovers.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.airline.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    pub fn toggle_certificate(&mut self, certificate: Certificate) {
        if let Some(pos) = self.certificates.iter().position(|c| *c == certificate) {
            self.certificates.remove(pos);
        } else {
            self.certificates.push(certificate);
        }
    }

    pub fn is_certificate_selected(&self, certificate: &Certificate) -> bool {
        self.certificates.contains(certificate)
    }

    /// Clear every filter-only constraint and the pet type. Route, dates and
    /// passengers are kept so a reset alone never forces a new search.
    pub fn reset_filters(&mut self) {
        self.search.pet_type = None;
        self.crate_dimensions = CrateDimensions::default();
        self.no_carrier_required = None;
        self.certificates.clear();
        self.allow_layovers = None;
        self.min_price = None;
        self.max_price = None;
        self.airline = None;
    }
}
