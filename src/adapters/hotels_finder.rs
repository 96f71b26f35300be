//! `hotels_finder`: Google Hotels lookup through SerpAPI

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
pub struct HotelsInput {
    /// Location of the hotel
    pub q: String,
    /// Check-in date. The format is YYYY-MM-DD. e.g. 2024-06-22
    pub check_in_date: String,
    /// Check-out date. The format is YYYY-MM-DD. e.g. 2024-06-28
    pub check_out_date: String,
    /// Sort order of the results. Default is 8, sort by highest rating
    #[serde(default = "default_sort_by")]
    pub sort_by: u32,
    /// Number of adults. Default to 1.
    #[serde(default = "default_one")]
    pub adults: u32,
    /// Number of children. Default to 0.
    #[serde(default)]
    pub children: u32,
    /// Number of rooms. Default to 1.
    #[serde(default = "default_one")]
    pub rooms: u32,
    /// Only include certain hotel classes in the results, for example 2,3,4
    #[serde(default)]
    pub hotel_class: Option<String>,
}

fn default_sort_by() -> u32 {
    8
}

fn default_one() -> u32 {
    1
}

pub struct HotelsFinder {
    backend: Arc<dyn SearchBackend>,
    locale: SearchLocale,
    max_results: usize,
    today: Today,
}

impl HotelsFinder {
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

    /// Semantic checks, in order; returns the parsed dates
    pub fn validate(&self, input: &HotelsInput) -> Result<(NaiveDate, NaiveDate), ToolError> {
        if input.q.trim().is_empty()
            || input.check_in_date.trim().is_empty()
            || input.check_out_date.trim().is_empty()
        {
            return Err(ToolError::Validation(
                "Missing required parameters: q, check_in_date, check_out_date".to_string(),
            ));
        }

        let (check_in, check_out) =
            match (parse_date(&input.check_in_date), parse_date(&input.check_out_date)) {
                (Some(ci), Some(co)) => (ci, co),
                _ => {
                    return Err(ToolError::Validation(
                        "Dates must be in YYYY-MM-DD format".to_string(),
                    ))
                }
            };

        if check_out <= check_in {
            return Err(ToolError::Validation(
                "check_out_date must be after check_in_date".to_string(),
            ));
        }
        if check_in < self.today.date() {
            return Err(ToolError::Validation(
                "check_in_date cannot be in the past".to_string(),
            ));
        }
        if input.adults < 1 {
            return Err(ToolError::Validation("adults must be >= 1".to_string()));
        }
        if input.rooms < 1 {
            return Err(ToolError::Validation("rooms must be >= 1".to_string()));
        }

        Ok((check_in, check_out))
    }

    fn query(&self, input: &HotelsInput) -> SearchQuery {
        let mut query: SearchQuery = vec![
            ("engine", "google_hotels".to_string()),
            ("hl", self.locale.language.clone()),
            ("gl", self.locale.country.clone()),
            ("currency", self.locale.currency.clone()),
            ("q", input.q.trim().to_string()),
            ("check_in_date", input.check_in_date.trim().to_string()),
            ("check_out_date", input.check_out_date.trim().to_string()),
            ("adults", input.adults.to_string()),
            ("children", input.children.to_string()),
            ("rooms", input.rooms.to_string()),
            ("sort_by", input.sort_by.to_string()),
        ];
        if let Some(class) = input.hotel_class.as_deref().filter(|c| !c.trim().is_empty()) {
            query.push(("hotel_class", class.trim().to_string()));
        }
        query
    }
}

#[async_trait]
impl Tool for HotelsFinder {
    fn name(&self) -> &str {
        "hotels_finder"
    }

    fn description(&self) -> &str {
        "Find hotels using the Google Hotels engine. Returns the top matching properties."
    }

    fn input_schema(&self) -> Value {
        parameters_schema::<HotelsInput>()
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let input: HotelsInput = parse_params(args)?;
        self.validate(&input)?;

        info!(q = %input.q, check_in = %input.check_in_date, "Searching hotels");
        let body = self.backend.search(&self.query(&input)).await?;
        Ok(Value::Array(take_results(&body, "properties", self.max_results)))
    }
}
