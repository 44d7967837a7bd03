//! Pure form validation.
//!
//! `validate` is re-run after every relevant field change; conditional rules
//! such as "return date required for round trips" are plain branches here.

use std::fmt;

use thiserror::Error;

use crate::criteria::{SearchCriteria, ADULT_PET_AGE_WEEKS};

pub const MIN_PET_WEIGHT_KG: f64 = 0.5;
pub const MAX_PET_WEIGHT_KG: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Origin,
    Destination,
    DepartureDate,
    ReturnDate,
    Passengers,
    PetType,
    PetAge,
    PetWeight,
    PetBreed,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Origin => "origin",
            Field::Destination => "destination",
            Field::DepartureDate => "departure date",
            Field::ReturnDate => "return date",
            Field::Passengers => "passengers",
            Field::PetType => "pet type",
            Field::PetAge => "pet age",
            Field::PetWeight => "pet weight",
            Field::PetBreed => "pet breed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(Field),

    #[error("return date must not be before the departure date")]
    ReturnBeforeDeparture,

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: Field, min: f64, max: f64 },

    #[error("expected {expected} child ages, got {actual}")]
    ChildAgesMismatch { expected: u32, actual: usize },
}

impl ValidationError {
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::Required(field) | ValidationError::OutOfRange { field, .. } => {
                Some(*field)
            }
            ValidationError::ReturnBeforeDeparture => Some(Field::ReturnDate),
            ValidationError::ChildAgesMismatch { .. } => Some(Field::Passengers),
        }
    }
}

/// Which rules apply to a given form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormConfig {
    pub require_origin: bool,
    pub require_destination: bool,
    pub require_departure_date: bool,
    pub require_passengers: bool,
    pub require_pet_type: bool,
    pub require_pet_weight: bool,
    pub require_pet_breed: bool,
    pub trip_type_validation: bool,
    pub departure_date_validation: bool,
    pub pet_age_validation: bool,
}

impl FormConfig {
    /// The search page: route, departure and passengers are mandatory.
    pub fn search() -> Self {
        Self {
            require_origin: true,
            require_destination: true,
            require_departure_date: true,
            require_passengers: true,
            require_pet_type: false,
            require_pet_weight: false,
            require_pet_breed: false,
            trip_type_validation: true,
            departure_date_validation: true,
            pet_age_validation: true,
        }
    }

    /// The filter panel: nothing is mandatory, ranges still apply.
    pub fn filters() -> Self {
        Self {
            require_origin: false,
            require_destination: false,
            require_departure_date: false,
            require_passengers: false,
            require_pet_type: false,
            require_pet_weight: false,
            require_pet_breed: false,
            trip_type_validation: false,
            departure_date_validation: false,
            pet_age_validation: false,
        }
    }
}

pub fn validate(criteria: &SearchCriteria, config: &FormConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.require_origin && criteria.origin_code().is_empty() {
        errors.push(ValidationError::Required(Field::Origin));
    }
    if config.require_destination && criteria.destination_code().is_empty() {
        errors.push(ValidationError::Required(Field::Destination));
    }
    if config.require_departure_date && criteria.departure_date.is_none() {
        errors.push(ValidationError::Required(Field::DepartureDate));
    }
    if config.trip_type_validation && criteria.is_round_trip() && criteria.return_date.is_none()
    {
        errors.push(ValidationError::Required(Field::ReturnDate));
    }
    if config.departure_date_validation && criteria.is_round_trip() {
        if let (Some(departure), Some(ret)) = (criteria.departure_date, criteria.return_date) {
            if ret < departure {
                errors.push(ValidationError::ReturnBeforeDeparture);
            }
        }
    }

    let passengers = &criteria.passengers;
    if config.require_passengers && passengers.adults == 0 {
        errors.push(ValidationError::Required(Field::Passengers));
    }
    if passengers.children_ages.len() != passengers.children as usize {
        errors.push(ValidationError::ChildAgesMismatch {
            expected: passengers.children,
            actual: passengers.children_ages.len(),
        });
    }

    if criteria.has_pet {
        validate_pet(criteria, config, &mut errors);
    }

    errors
}

fn validate_pet(criteria: &SearchCriteria, config: &FormConfig, errors: &mut Vec<ValidationError>) {
    if config.require_pet_type && criteria.pet_type.is_none() {
        errors.push(ValidationError::Required(Field::PetType));
    }
    match criteria.pet_weight_kg {
        Some(weight) if !(MIN_PET_WEIGHT_KG..=MAX_PET_WEIGHT_KG).contains(&weight) => {
            errors.push(ValidationError::OutOfRange {
                field: Field::PetWeight,
                min: MIN_PET_WEIGHT_KG,
                max: MAX_PET_WEIGHT_KG,
            });
        }
        None if config.require_pet_weight => {
            errors.push(ValidationError::Required(Field::PetWeight));
        }
        _ => {}
    }
    let breed_missing = criteria
        .pet_breed
        .as_deref()
        .map_or(true, |b| b.trim().is_empty());
    if config.require_pet_breed && breed_missing {
        errors.push(ValidationError::Required(Field::PetBreed));
    }
    if config.pet_age_validation {
        if let Some(age) = criteria.pet_age_weeks {
            if age > ADULT_PET_AGE_WEEKS {
                errors.push(ValidationError::OutOfRange {
                    field: Field::PetAge,
                    min: 0.0,
                    max: f64::from(ADULT_PET_AGE_WEEKS),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CityInput, TripType};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn complete() -> SearchCriteria {
        SearchCriteria {
            trip_type: TripType::RoundTrip,
            origin: Some(CityInput::Code("BOG".into())),
            destination: Some(CityInput::Code("MAD".into())),
            departure_date: Some(date(2025, 3, 1)),
            return_date: Some(date(2025, 3, 8)),
            ..SearchCriteria::default()
        }
    }

    #[test]
    fn complete_form_is_valid() {
        assert!(validate(&complete(), &FormConfig::search()).is_empty());
    }

    #[test]
    fn empty_form_reports_required_fields() {
        let errors = validate(&SearchCriteria::default(), &FormConfig::search());
        assert!(errors.contains(&ValidationError::Required(Field::Origin)));
        assert!(errors.contains(&ValidationError::Required(Field::Destination)));
        assert!(errors.contains(&ValidationError::Required(Field::DepartureDate)));
        assert!(errors.contains(&ValidationError::Required(Field::ReturnDate)));
    }

    #[test]
    fn return_date_only_required_for_round_trip() {
        let mut criteria = complete();
        criteria.return_date = None;
        criteria.trip_type = TripType::OneWay;
        assert!(validate(&criteria, &FormConfig::search()).is_empty());
    }

    #[test]
    fn return_before_departure_rejected() {
        let mut criteria = complete();
        criteria.return_date = Some(date(2025, 2, 20));
        assert_eq!(
            validate(&criteria, &FormConfig::search()),
            vec![ValidationError::ReturnBeforeDeparture]
        );
    }

    #[test]
    fn pet_weight_range_checked_only_with_pet() {
        let mut criteria = complete();
        criteria.pet_weight_kg = Some(70.0);
        let errors = validate(&criteria, &FormConfig::filters());
        assert_eq!(errors[0].field(), Some(Field::PetWeight));

        criteria.has_pet = false;
        assert!(validate(&criteria, &FormConfig::filters()).is_empty());
    }

    #[test]
    fn child_ages_must_match_count() {
        let mut criteria = complete();
        criteria.passengers.children = 2;
        criteria.passengers.children_ages = vec![4];
        assert_eq!(
            validate(&criteria, &FormConfig::search()),
            vec![ValidationError::ChildAgesMismatch {
                expected: 2,
                actual: 1
            }]
        );
    }

    #[test]
    fn filter_config_requires_nothing() {
        assert!(validate(&SearchCriteria::default(), &FormConfig::filters()).is_empty());
    }
}
