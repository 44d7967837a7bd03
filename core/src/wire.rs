//! Request bodies sent to `POST /search` and `POST /filter`.
//!
//! Segment fields are snake_case on the wire; everything else is camelCase.
//! Keep the split: the remote contract depends on it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub origin: String,
    pub origin_country: Option<String>,
    pub destination: String,
    pub destination_country: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub age: u32,
    pub weight: f64,
    pub breed: String,
    pub currency: String,
    pub pet_type: String,
    pub locale: String,
    pub trip_class: String,
    pub passengers: PassengerCounts,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// Filter-only constraints. Under the sparse policy unset fields are left
/// out of the body; `isCarrierRequired` is tri-state and always sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_direct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_type: Option<String>,
    #[serde(default)]
    pub is_carrier_required: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub search_id: String,
    pub filter_parameters: FilterParameters,
    pub age: u32,
    pub weight: f64,
    pub breed: Option<String>,
    pub currency: String,
    pub pet_type: String,
    pub locale: Option<String>,
    pub trip_class: String,
    pub passengers: PassengerCounts,
    pub segments: Vec<Segment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_fields_stay_snake_case() {
        let request = SearchRequest {
            age: 24,
            weight: 5.0,
            breed: "Mixed".into(),
            currency: "USD".into(),
            pet_type: "Dog".into(),
            locale: "es".into(),
            trip_class: "Y".into(),
            passengers: PassengerCounts {
                adults: 1,
                children: 0,
                infants: 0,
            },
            segments: vec![Segment {
                origin: "BOG".into(),
                origin_country: Some("CO".into()),
                destination: "MAD".into(),
                destination_country: None,
                date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["petType"], "Dog");
        assert_eq!(json["tripClass"], "Y");
        assert_eq!(json["segments"][0]["origin_country"], "CO");
        assert!(json["segments"][0]["destination_country"].is_null());
        assert_eq!(json["segments"][0]["date"], "2025-03-01");
    }

    #[test]
    fn sparse_filter_parameters_omit_unset_fields() {
        let params = FilterParameters {
            is_direct: Some(true),
            ..FilterParameters::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["isDirect"], true);
        assert!(json.get("minPrice").is_none());
        assert!(json.get("airlineCode").is_none());
        assert!(json["isCarrierRequired"].is_null());
    }
}
