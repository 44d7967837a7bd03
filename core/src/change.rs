//! Search-vs-filter decision on "apply filters".
//!
//! A new remote search is needed when any of five axes differs from the last
//! successful search: route, travel class, trip type, dates, or passenger
//! composition (child ages compared in order). Otherwise the cheaper filter
//! call on the existing `searchId` is enough.

use chrono::NaiveDate;

use crate::criteria::{SearchCriteria, TravelClass, TripType};

/// The parameters of a search that determine its result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub origin: String,
    pub destination: String,
    pub travel_class: TravelClass,
    pub trip_type: TripType,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    pub children_ages: Vec<u32>,
}

impl SearchSnapshot {
    pub fn of(criteria: &SearchCriteria) -> Self {
        Self {
            origin: criteria.origin_code().to_string(),
            destination: criteria.destination_code().to_string(),
            travel_class: criteria.passengers.travel_class,
            trip_type: criteria.trip_type,
            departure_date: criteria.departure_date,
            // A one-way form may still hold a stale return date.
            return_date: criteria.return_date.filter(|_| criteria.is_round_trip()),
            adults: criteria.passengers.adults,
            children: criteria.passengers.children,
            children_ages: criteria.passengers.children_ages.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub route: bool,
    pub travel_class: bool,
    pub trip_type: bool,
    pub dates: bool,
    pub passengers: bool,
}

impl ChangeSet {
    pub fn between(previous: &SearchSnapshot, current: &SearchSnapshot) -> Self {
        Self {
            route: previous.origin != current.origin
                || previous.destination != current.destination,
            travel_class: previous.travel_class != current.travel_class,
            trip_type: previous.trip_type != current.trip_type,
            dates: previous.departure_date != current.departure_date
                || previous.return_date != current.return_date,
            passengers: previous.adults != current.adults
                || previous.children != current.children
                || previous.children_ages != current.children_ages,
        }
    }

    pub fn any(&self) -> bool {
        self.route || self.travel_class || self.trip_type || self.dates || self.passengers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshAction {
    NewSearch,
    Filter,
}

/// Without a prior search (or its `searchId`) there is nothing to filter.
pub fn decide_refresh(
    previous: Option<&SearchSnapshot>,
    search_id: Option<&str>,
    current: &SearchCriteria,
) -> RefreshAction {
    match (previous, search_id) {
        (Some(previous), Some(id)) if !id.is_empty() => {
            if ChangeSet::between(previous, &SearchSnapshot::of(current)).any() {
                RefreshAction::NewSearch
            } else {
                RefreshAction::Filter
            }
        }
        _ => RefreshAction::NewSearch,
    }
}
