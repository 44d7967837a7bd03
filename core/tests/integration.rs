//! End-to-end runs against the live mock server.
//!
//! Each test starts the mock server on a random port and drives the real
//! `HttpFlightRepository` over ureq, so request mapping, transport and
//! response parsing are checked against the server's own DTOs.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::NaiveDate;
use petfly_core::session::NoticeKind;
use petfly_core::{
    ApiError, AppConfig, CityInput, Completion, FilterCriteria, FlightRepository,
    HttpFlightRepository, MapperOptions, SearchCriteria, SearchSession, SessionState, TripType,
    UreqTransport,
};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn repository(addr: SocketAddr) -> HttpFlightRepository<UreqTransport> {
    let base = format!("http://{addr}");
    HttpFlightRepository::new(&base, &base, UreqTransport::new(Duration::from_secs(5)))
}

fn criteria(origin: &str) -> SearchCriteria {
    SearchCriteria {
        trip_type: TripType::RoundTrip,
        origin: Some(CityInput::Code(origin.into())),
        destination: Some(CityInput::Code("MAD".into())),
        departure_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        return_date: NaiveDate::from_ymd_opt(2025, 3, 8),
        ..SearchCriteria::default()
    }
}

fn options() -> MapperOptions {
    MapperOptions::strict().on(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap())
}

#[test]
fn lookups_over_http() {
    let repo = repository(start_server());

    let cities = repo.search_cities("bog", 5);
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].city_code, "BOG");

    assert!(repo.search_cities("b", 5).is_empty(), "short query never hits the server");

    let currencies = repo.get_currencies();
    assert!(currencies.iter().any(|c| c.name == "COP"));

    let breeds = repo.get_breeds(2);
    assert!(!breeds.is_empty());
    assert!(breeds.iter().all(|b| b.pet_type_id == 2));
}

#[test]
fn search_filter_book_over_http() {
    let repo = repository(start_server());

    // Step 1: search.
    let searched = repo
        .search_flights(&criteria("BOG"), "USD", "es", &options())
        .unwrap();
    let search_id = searched.search_id.clone().expect("search id");
    assert!(!searched.flight_tickets.is_empty());
    assert!(searched.flight_tickets.iter().all(|t| t.is_round_trip()));
    assert!(searched.flight_tickets.iter().any(|t| t.total.is_none()));
    assert!(!searched.filters_boundary.airlines.is_empty());

    // Step 2: narrow to direct flights.
    let filters = FilterCriteria {
        allow_layovers: Some(false),
        ..FilterCriteria::seeded_from(&criteria("BOG"))
    };
    let filtered = repo
        .filter_flights(&filters, &search_id, "USD", "es", &MapperOptions::with_defaults())
        .unwrap();
    assert!(!filtered.flight_tickets.is_empty());
    assert!(filtered.flight_tickets.len() < searched.flight_tickets.len());
    assert!(filtered.flight_tickets.iter().all(|t| t.is_direct));

    // Step 3: booking link for a filtered ticket.
    let terms = filtered.flight_tickets[0].terms_url.clone().unwrap();
    let link = repo.get_booking_link(&search_id, &terms).unwrap();
    assert_eq!(link.method, "GET");
    assert!(link.url.ends_with(&terms));

    // Step 4: unknown search id.
    let err = repo
        .filter_flights(&filters, "missing", "USD", "es", &MapperOptions::with_defaults())
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn session_end_to_end() {
    let repo = repository(start_server());
    let mut session = SearchSession::new(&AppConfig::default(), "USD", "es");
    let states = session.watch_state();

    let completion = session.search(&repo, &criteria("BOG")).unwrap();
    let Completion::Applied(notice) = completion else {
        panic!("search was not applied");
    };
    let found = session.results().len();
    assert_eq!(notice.kind, NoticeKind::Found(found));
    assert_eq!(session.state(), SessionState::Results);
    assert_eq!(states.latest(), Some(SessionState::Results));

    // Same route and dates: the session filters instead of searching again.
    let mut filters = session.filter_criteria();
    filters.allow_layovers = Some(false);
    let search_id = session.search_id().map(str::to_string);
    session.apply_filters(&repo, &filters).unwrap();
    assert_eq!(session.state(), SessionState::Results);
    assert_eq!(session.search_id().map(str::to_string), search_id);
    assert!(session.results().len() < found);

    let ticket = session.results().tickets()[0].clone();
    let link = session.booking_link(&repo, &ticket).unwrap();
    assert_eq!(link.gate_id, 125);

    // A search from the failing origin keeps the direct-flight results.
    let kept = session.results().len();
    let completion = session.search(&repo, &criteria("ERR")).unwrap();
    assert!(matches!(
        completion,
        Completion::Applied(ref n) if matches!(n.kind, NoticeKind::Failed(_))
    ));
    assert_eq!(session.state(), SessionState::SearchFailed);
    assert_eq!(session.results().len(), kept);
}

#[test]
fn unreachable_server() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let repo = repository(addr);

    let err = repo
        .search_flights(&criteria("BOG"), "USD", "es", &options())
        .unwrap_err();
    assert!(err.is_transport(), "expected a transport error, got {err:?}");

    assert!(repo.get_currencies().is_empty());
    assert!(repo.search_cities("bogota", 5).is_empty());
}

/// Accepts connections and holds them open without ever answering.
fn start_silent_server() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    addr
}

#[test]
fn hung_server_times_out() {
    let base = format!("http://{}", start_silent_server());
    let transport = UreqTransport::new(Duration::from_millis(300));
    let repo = HttpFlightRepository::new(&base, &base, transport);

    let err = repo
        .search_flights(&criteria("BOG"), "USD", "es", &options())
        .unwrap_err();
    assert_eq!(err, ApiError::Timeout);

    let mut session = SearchSession::new(&AppConfig::default(), "USD", "es");
    let completion = session.search(&repo, &criteria("BOG")).unwrap();
    assert!(matches!(
        completion,
        Completion::Applied(ref n) if matches!(n.kind, NoticeKind::Failed(_))
    ));
    assert_eq!(session.state(), SessionState::SearchFailed);
}
