//! `flights_finder`: Google Flights lookup through SerpAPI

use async_trait::async_trait;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::dates::{parse_date, Today};
use super::schema::{parameters_schema, parse_params};
use super::serpapi::{take_results, SearchBackend, SearchLocale, SearchQuery};
use crate::agents::error::ToolError;
use crate::domain::Tool;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FlightsInput {
    /// Departure airport code (IATA), e.g. JFK, or a location kgmid
    pub departure_airport: String,
    /// Arrival airport code (IATA), e.g. CDG, or a location kgmid
    pub arrival_airport: String,
    /// Outbound date. The format is YYYY-MM-DD. e.g. 2024-06-01
    pub outbound_date: String,
    /// Return date. The format is YYYY-MM-DD. Omit for a one-way trip
    #[serde(default)]
    pub return_date: Option<String>,
    /// Number of adults. Default to 1.
    #[serde(default = "default_one")]
    pub adults: u32,
    /// Number of children. Default to 0.
    #[serde(default)]
    pub children: u32,
    /// Number of infants in seat. Default to 0.
    #[serde(default)]
    pub infants_in_seat: u32,
    /// Number of infants on lap. Default to 0.
    #[serde(default)]
    pub infants_on_lap: u32,
    /// Travel class: 1 economy, 2 premium economy, 3 business, 4 first. Default to 1.
    #[serde(default = "default_one")]
    pub travel_class: u32,
    /// Number of stops: 0 any, 1 nonstop only, 2 one stop or fewer, 3 two stops or fewer. Default to 0.
    #[serde(default)]
    pub stops: u32,
}

fn default_one() -> u32 {
    1
}

pub struct FlightsFinder {
    backend: Arc<dyn SearchBackend>,
    locale: SearchLocale,
    max_results: usize,
    today: Today,
}

impl FlightsFinder {
    pub fn new(backend: Arc<dyn SearchBackend>, locale: SearchLocale, max_results: usize) -> Self {
        Self {
            backend,
            locale,
            max_results,
            today: Today::Local,
        }
    }

    /// Pin "today" for date checks
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Today::Fixed(today);
        self
    }

    /// Semantic checks, in order; returns outbound and optional return dates
    pub fn validate(
        &self,
        input: &FlightsInput,
    ) -> Result<(NaiveDate, Option<NaiveDate>), ToolError> {
        if input.departure_airport.trim().is_empty()
            || input.arrival_airport.trim().is_empty()
            || input.outbound_date.trim().is_empty()
        {
            return Err(ToolError::Validation(
                "Missing required parameters: departure_airport, arrival_airport, outbound_date"
                    .to_string(),
            ));
        }

        let bad_format =
            || ToolError::Validation("Dates must be in YYYY-MM-DD format".to_string());
        let outbound = parse_date(&input.outbound_date).ok_or_else(bad_format)?;
        let inbound = match input.return_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date(raw).ok_or_else(bad_format)?),
        };

        if let Some(inbound) = inbound {
            if inbound < outbound {
                return Err(ToolError::Validation(
                    "return_date must not be before outbound_date".to_string(),
                ));
            }
        }
        if outbound < self.today.date() {
            return Err(ToolError::Validation(
                "outbound_date cannot be in the past".to_string(),
            ));
        }
        if input.adults < 1 {
            return Err(ToolError::Validation("adults must be >= 1".to_string()));
        }
        if !(1..=4).contains(&input.travel_class) {
            return Err(ToolError::Validation(
                "travel_class must be between 1 and 4".to_string(),
            ));
        }
        if input.stops > 3 {
            return Err(ToolError::Validation(
                "stops must be between 0 and 3".to_string(),
            ));
        }
        if input.infants_on_lap > input.adults {
            return Err(ToolError::Validation(
                "infants_on_lap cannot exceed adults".to_string(),
            ));
        }

        Ok((outbound, inbound))
    }

    fn query(&self, input: &FlightsInput, round_trip: bool) -> SearchQuery {
        let mut query: SearchQuery = vec![
            ("engine", "google_flights".to_string()),
            ("hl", self.locale.language.clone()),
            ("gl", self.locale.country.clone()),
            ("currency", self.locale.currency.clone()),
            ("departure_id", airport_id(&input.departure_airport)),
            ("arrival_id", airport_id(&input.arrival_airport)),
            ("outbound_date", input.outbound_date.trim().to_string()),
            ("type", if round_trip { "1" } else { "2" }.to_string()),
            ("adults", input.adults.to_string()),
            ("children", input.children.to_string()),
            ("infants_in_seat", input.infants_in_seat.to_string()),
            ("infants_on_lap", input.infants_on_lap.to_string()),
            ("travel_class", input.travel_class.to_string()),
            ("stops", input.stops.to_string()),
        ];
        if round_trip {
            if let Some(date) = &input.return_date {
                query.push(("return_date", date.trim().to_string()));
            }
        }
        query
    }
}

/// IATA codes are normalised to upper case; kgmids such as `/m/02_286` are case-sensitive
/// and pass through unchanged.
fn airport_id(raw: &str) -> String {
    let code = raw.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        code.to_ascii_uppercase()
    } else {
        code.to_string()
    }
}

#[async_trait]
impl Tool for FlightsFinder {
    fn name(&self) -> &str {
        "flights_finder"
    }

    fn description(&self) -> &str {
        "Find flights using the Google Flights engine. Returns the best matching itineraries."
    }

    fn input_schema(&self) -> Value {
        parameters_schema::<FlightsInput>()
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let input: FlightsInput = parse_params(args)?;
        let (_, inbound) = self.validate(&input)?;

        info!(
            from = %input.departure_airport,
            to = %input.arrival_airport,
            outbound = %input.outbound_date,
            "Searching flights"
        );
        let body = self
            .backend
            .search(&self.query(&input, inbound.is_some()))
            .await?;

        let mut flights = take_results(&body, "best_flights", self.max_results);
        if flights.len() < self.max_results {
            let missing = self.max_results - flights.len();
            flights.extend(take_results(&body, "other_flights", missing));
        }
        Ok(Value::Array(flights))
    }
}
