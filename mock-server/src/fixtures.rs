use crate::{
    Airline, Boundary, Breed, City, Currency, FlightGroup, Leg, MinutesRange, PriceBounds,
    PriceRange, Segment, Ticket,
};

const HUB: &str = "PTY";

pub fn cities() -> Vec<City> {
    [
        ("Bogotá", "BOG", "CO", "Colombia"),
        ("Medellín", "MDE", "CO", "Colombia"),
        ("Cali", "CLO", "CO", "Colombia"),
        ("Cartagena", "CTG", "CO", "Colombia"),
        ("Lima", "LIM", "PE", "Perú"),
        ("Ciudad de México", "MEX", "MX", "México"),
        ("Madrid", "MAD", "ES", "España"),
        ("Barcelona", "BCN", "ES", "España"),
        ("Miami", "MIA", "US", "United States"),
    ]
    .into_iter()
    .map(|(name, code, country_code, country)| City {
        city_name: name.to_string(),
        city_code: code.to_string(),
        country_code: country_code.to_string(),
        country_name: country.to_string(),
        display_name: format!("{name}, {country} ({code})"),
    })
    .collect()
}

pub fn currencies() -> Vec<Currency> {
    [("USD", "$"), ("EUR", "€"), ("COP", "$"), ("MXN", "$"), ("PEN", "S/")]
        .into_iter()
        .zip(1..)
        .map(|((name, symbol), id)| Currency {
            id,
            name: name.to_string(),
            symbol: symbol.to_string(),
        })
        .collect()
}

pub fn breeds(pet_type_id: u32) -> Vec<Breed> {
    let names: &[&str] = match pet_type_id {
        1 => &["Mixed", "Beagle", "Border Collie", "Pug", "Poodle"],
        2 => &["Mixed", "Bengal", "Sphynx", "Ragdoll"],
        _ => &[],
    };
    names
        .iter()
        .map(|name| Breed {
            name: name.to_string(),
            pet_type_id,
        })
        .collect()
}

struct Fare {
    airline: &'static str,
    code: &'static str,
    price: f64,
    legs: &'static [u32],
    pet_fee: Option<f64>,
}

const fn fare(
    airline: &'static str,
    code: &'static str,
    price: f64,
    legs: &'static [u32],
    pet_fee: Option<f64>,
) -> Fare {
    Fare {
        airline,
        code,
        price,
        legs,
        pet_fee,
    }
}

const FARES: [Fare; 6] = [
    fare("Avianca", "AV", 450.0, &[630], Some(90.0)),
    fare("LATAM", "LA", 890.0, &[180, 500], Some(150.0)),
    fare("Copa Airlines", "CM", 620.0, &[200, 460], Some(110.0)),
    fare("Iberia", "IB", 550.0, &[600], Some(100.0)),
    fare("Air Europa", "UX", 715.0, &[240, 420], Some(120.0)),
    // Pet travel not priced by this carrier.
    fare("Wingo", "P5", 380.0, &[150, 540], None),
];

pub fn tickets(
    outbound: &Segment,
    inbound: Option<&Segment>,
    currency: &str,
    trip_class: &str,
) -> Vec<Ticket> {
    let (cabin, multiplier) = match trip_class {
        "C" => ("Business", 2.5),
        _ => ("Economy", 1.0),
    };
    FARES
        .iter()
        .enumerate()
        .map(|(i, fare)| {
            let mut flights = vec![group(fare, outbound, cabin)];
            if let Some(inbound) = inbound {
                flights.push(group(fare, inbound, cabin));
            }
            let price = fare.price * multiplier;
            let max_stops = fare.legs.len() as u32 - 1;
            let priced = |amount: f64| PriceRange {
                min: amount,
                max: amount,
                currency: currency.to_string(),
            };
            Ticket {
                flights,
                max_stops,
                max_stop_duration: if max_stops > 0 { 95 } else { 0 },
                price,
                currency: currency.to_string(),
                is_direct: max_stops == 0,
                mr_price: fare.pet_fee.map(priced),
                ae_price: fare.pet_fee.filter(|_| i % 2 == 0).map(|fee| priced(fee / 2.0)),
                ps_price: fare.pet_fee.map(|_| priced(0.0)),
                total: fare.pet_fee.map(|fee| PriceRange {
                    min: price + fee,
                    max: price + fee + 40.0,
                    currency: currency.to_string(),
                }),
                terms_url: (9_000 + i).to_string(),
            }
        })
        .collect()
}

fn group(fare: &Fare, segment: &Segment, cabin: &str) -> FlightGroup {
    let last = fare.legs.len() - 1;
    let flight_items = fare
        .legs
        .iter()
        .enumerate()
        .map(|(i, minutes)| {
            let start = 7 + 3 * i as u32;
            Leg {
                airline_name: fare.airline.to_string(),
                airline_code: fare.code.to_string(),
                departure: if i == 0 { segment.origin.clone() } else { HUB.to_string() },
                departure_time: format!("{}T{:02}:00:00", segment.date, start),
                arrival: if i == last { segment.destination.clone() } else { HUB.to_string() },
                arrival_time: format!(
                    "{}T{:02}:00:00",
                    segment.date,
                    (start + minutes / 60).min(23)
                ),
                duration: *minutes,
                trip_class: cabin.to_string(),
                image_url: format!("https://pics.avs.io/200/200/{}.png", fare.code),
            }
        })
        .collect();
    FlightGroup { flight_items }
}

pub fn boundary(tickets: &[Ticket]) -> Boundary {
    let durations: Vec<u32> = tickets
        .iter()
        .map(|t| {
            t.flights
                .iter()
                .flat_map(|g| &g.flight_items)
                .map(|leg| leg.duration)
                .sum()
        })
        .collect();
    let stops: Vec<u32> = tickets.iter().map(|t| t.max_stop_duration).collect();
    let prices: Vec<f64> = tickets.iter().map(|t| t.price).collect();

    let mut airlines: Vec<Airline> = Vec::new();
    for leg in tickets.iter().flat_map(|t| &t.flights).flat_map(|g| &g.flight_items) {
        if !airlines.iter().any(|a| a.iata == leg.airline_code) {
            airlines.push(Airline {
                name: leg.airline_name.clone(),
                iata: leg.airline_code.clone(),
            });
        }
    }

    Boundary {
        flights_duration: minutes(&durations),
        stops_duration: minutes(&stops),
        price: PriceBounds {
            min: prices.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max: prices.iter().copied().reduce(f64::max).unwrap_or(0.0),
            currency: tickets.first().map(|t| t.currency.clone()),
        },
        airlines,
    }
}

fn minutes(values: &[u32]) -> MinutesRange {
    MinutesRange {
        min: values.iter().copied().min().unwrap_or(0),
        max: values.iter().copied().max().unwrap_or(0),
    }
}
