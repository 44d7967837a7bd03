//! Client-side ordering and "load more" pagination of a result set.
//!
//! # Design
//! `ResultsView` keeps the authoritative tickets untouched and derives a
//! display order as a vector of indices. Every sort or replacement rebuilds
//! that order from scratch with a stable sort and resets the window, so the
//! displayed prefix and the cursor can never disagree.

use std::cmp::Ordering;

use crate::config::ResultsConfig;
use crate::types::FlightTicket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// `total.min`, the pet-inclusive price.
    Price,
    /// Sum of every leg across outbound and return.
    Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Same key flips the direction; a different key starts ascending.
    pub fn toggled(current: Option<SortState>, key: SortKey) -> Self {
        match current {
            Some(state) if state.key == key => Self {
                key,
                direction: state.direction.flipped(),
            },
            _ => Self::ascending(key),
        }
    }
}

/// Tickets without a `total` go last in either direction.
pub fn compare_tickets(a: &FlightTicket, b: &FlightTicket, sort: SortState) -> Ordering {
    match sort.key {
        SortKey::Price => {
            match (a.total.as_ref(), b.total.as_ref()) {
                (Some(x), Some(y)) => sort.direction.apply(x.min.total_cmp(&y.min)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
        SortKey::Duration => sort
            .direction
            .apply(a.total_duration().cmp(&b.total_duration())),
    }
}

#[derive(Debug, Clone)]
pub struct ResultsView {
    tickets: Vec<FlightTicket>,
    order: Vec<usize>,
    sort: Option<SortState>,
    window: usize,
    initial_window: usize,
    step: usize,
}

impl ResultsView {
    pub fn new(tickets: Vec<FlightTicket>, config: &ResultsConfig) -> Self {
        let mut view = Self {
            tickets: Vec::new(),
            order: Vec::new(),
            sort: None,
            window: config.initial_window,
            initial_window: config.initial_window,
            step: config.load_more_step,
        };
        view.replace(tickets);
        view
    }

    /// Install a new authoritative result set, keeping the current sort.
    pub fn replace(&mut self, tickets: Vec<FlightTicket>) {
        self.tickets = tickets;
        self.rebuild();
    }

    /// Apply a click on a sort control.
    pub fn toggle_sort(&mut self, key: SortKey) -> SortState {
        let state = SortState::toggled(self.sort, key);
        self.sort_by(state);
        state
    }

    pub fn sort_by(&mut self, state: SortState) {
        self.sort = Some(state);
        self.rebuild();
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    fn rebuild(&mut self) {
        let mut order: Vec<usize> = (0..self.tickets.len()).collect();
        if let Some(sort) = self.sort {
            let tickets = &self.tickets;
            order.sort_by(|&a, &b| compare_tickets(&tickets[a], &tickets[b], sort));
        }
        self.order = order;
        self.window = self.initial_window;
    }

    /// The visible prefix of the ordered results.
    pub fn displayed(&self) -> impl Iterator<Item = &FlightTicket> + '_ {
        self.order
            .iter()
            .take(self.window)
            .map(move |&i| &self.tickets[i])
    }

    pub fn displayed_len(&self) -> usize {
        self.window.min(self.order.len())
    }

    pub fn has_more(&self) -> bool {
        self.window < self.order.len()
    }

    /// Grow the window by one step, bounded by the result count.
    /// Returns the number of newly visible tickets.
    pub fn load_more(&mut self) -> usize {
        let before = self.displayed_len();
        if self.has_more() {
            self.window = (self.window + self.step).min(self.order.len());
        }
        self.displayed_len() - before
    }

    pub fn window_size(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// The authoritative set, in the order the repository returned it.
    pub fn tickets(&self) -> &[FlightTicket] {
        &self.tickets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlightGroup, FlightLeg, PriceRange};

    fn ticket(price: f64, total: Option<f64>, legs: &[u32]) -> FlightTicket {
        FlightTicket {
            flights: vec![FlightGroup {
                flight_items: legs
                    .iter()
                    .map(|d| FlightLeg {
                        airline_name: "Avianca".into(),
                        airline_code: "AV".into(),
                        departure: "BOG".into(),
                        departure_time: "2025-03-01T08:00:00".into(),
                        arrival: "MAD".into(),
                        arrival_time: "2025-03-01T20:00:00".into(),
                        duration: *d,
                        trip_class: "Economy".into(),
                        image_url: String::new(),
                    })
                    .collect(),
            }],
            max_stops: legs.len() as u32 - 1,
            max_stop_duration: 0,
            price,
            currency: "USD".into(),
            is_direct: legs.len() == 1,
            mr_price: None,
            ae_price: None,
            ps_price: None,
            total: total.map(|t| PriceRange {
                min: t,
                max: t + 10.0,
                currency: "USD".into(),
            }),
            terms_url: None,
        }
    }

    fn config(initial_window: usize, load_more_step: usize) -> ResultsConfig {
        ResultsConfig {
            initial_window,
            load_more_step,
        }
    }

    fn prices(view: &ResultsView) -> Vec<f64> {
        view.displayed().map(|t| t.price).collect()
    }

    #[test]
    fn price_sort_uses_total_min_not_bare_price() {
        let mut view = ResultsView::new(
            vec![ticket(100.0, Some(500.0), &[60]), ticket(300.0, Some(350.0), &[60])],
            &ResultsConfig::default(),
        );
        view.toggle_sort(SortKey::Price);
        assert_eq!(prices(&view), vec![300.0, 100.0]);
    }

    #[test]
    fn missing_total_sorts_last_both_directions() {
        let mut view = ResultsView::new(
            vec![
                ticket(1.0, None, &[60]),
                ticket(2.0, Some(200.0), &[60]),
                ticket(3.0, Some(100.0), &[60]),
            ],
            &ResultsConfig::default(),
        );
        view.toggle_sort(SortKey::Price);
        assert_eq!(prices(&view), vec![3.0, 2.0, 1.0]);
        view.toggle_sort(SortKey::Price);
        assert_eq!(prices(&view), vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn toggle_same_key_flips_and_new_key_resets() {
        let mut view = ResultsView::new(Vec::new(), &ResultsConfig::default());
        assert_eq!(
            view.toggle_sort(SortKey::Price).direction,
            SortDirection::Ascending
        );
        assert_eq!(
            view.toggle_sort(SortKey::Price).direction,
            SortDirection::Descending
        );
        assert_eq!(
            view.toggle_sort(SortKey::Duration),
            SortState::ascending(SortKey::Duration)
        );
    }

    #[test]
    fn double_toggle_restores_order() {
        let mut view = ResultsView::new(
            vec![
                ticket(1.0, Some(300.0), &[60]),
                ticket(2.0, Some(100.0), &[60]),
                ticket(3.0, Some(200.0), &[60]),
            ],
            &ResultsConfig::default(),
        );
        view.toggle_sort(SortKey::Price);
        let ascending = prices(&view);
        view.toggle_sort(SortKey::Price);
        view.toggle_sort(SortKey::Price);
        assert_eq!(prices(&view), ascending);
    }

    #[test]
    fn duration_sort_sums_all_legs() {
        let mut view = ResultsView::new(
            vec![ticket(1.0, Some(1.0), &[300, 300]), ticket(2.0, Some(1.0), &[500])],
            &ResultsConfig::default(),
        );
        view.toggle_sort(SortKey::Duration);
        assert_eq!(prices(&view), vec![2.0, 1.0]);
    }

    #[test]
    fn equal_keys_keep_original_order() {
        let mut view = ResultsView::new(
            vec![
                ticket(1.0, Some(100.0), &[60]),
                ticket(2.0, Some(100.0), &[60]),
                ticket(3.0, Some(100.0), &[60]),
            ],
            &ResultsConfig::default(),
        );
        view.toggle_sort(SortKey::Price);
        assert_eq!(prices(&view), vec![1.0, 2.0, 3.0]);
        view.toggle_sort(SortKey::Price);
        assert_eq!(prices(&view), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn window_invariant_holds_through_load_more() {
        let tickets: Vec<_> = (0..7).map(|i| ticket(i as f64, Some(1.0), &[60])).collect();
        let mut view = ResultsView::new(tickets, &config(3, 2));
        loop {
            assert_eq!(view.displayed().count(), view.window_size().min(view.len()));
            assert_eq!(view.has_more(), view.window_size() < view.len());
            if !view.has_more() {
                break;
            }
            view.load_more();
        }
        assert_eq!(view.displayed_len(), 7);
        assert_eq!(view.load_more(), 0);
    }

    #[test]
    fn sort_and_replace_reset_window() {
        let tickets: Vec<_> = (0..60).map(|i| ticket(i as f64, Some(1.0), &[60])).collect();
        let mut view = ResultsView::new(tickets.clone(), &ResultsConfig::default());
        assert_eq!(view.displayed_len(), 50);
        assert_eq!(view.load_more(), 10);
        assert!(!view.has_more());

        view.toggle_sort(SortKey::Duration);
        assert_eq!(view.displayed_len(), 50);

        view.load_more();
        view.replace(tickets);
        assert_eq!(view.displayed_len(), 50);
        assert_eq!(view.sort_state(), Some(SortState::ascending(SortKey::Duration)));
    }
}
