//! `build_itinerary`: model-generated day-by-day plans, no external search

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::schema::{parameters_schema, parse_params};
use crate::agents::adapter::ModelAdapter;
use crate::agents::error::ToolError;
use crate::domain::Tool;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ItineraryInput {
    /// Destination city or region
    pub destination: String,
    /// Number of days in the itinerary; must be >= 1
    pub days: i64,
    /// Number of travelers
    #[serde(default)]
    pub travelers: Option<u32>,
    /// Optional list of interests (e.g., culture, food, nature)
    #[serde(default)]
    pub interests: Option<Vec<String>>,
}

pub struct ItineraryBuilder {
    model: ModelAdapter,
}

impl ItineraryBuilder {
    /// `model` should carry the itinerary directive and its own temperature
    pub fn new(model: ModelAdapter) -> Self {
        Self { model }
    }

    pub fn validate(input: &ItineraryInput) -> Result<(), ToolError> {
        if input.days < 1 {
            return Err(ToolError::Validation("days must be >= 1".to_string()));
        }
        if input.destination.trim().is_empty() {
            return Err(ToolError::Validation("destination is required".to_string()));
        }
        Ok(())
    }

    /// Instruction sent to the model
    pub fn user_prompt(input: &ItineraryInput) -> String {
        let interests = match &input.interests {
            Some(list) if !list.is_empty() => list.join(", "),
            _ => "none specified".to_string(),
        };
        let travelers = match input.travelers {
            Some(n) => format!("for {} travelers", n),
            None => "for the traveler(s)".to_string(),
        };

        format!(
            "Build a {}-day itinerary for {} {}.\n\
             Interests: {}.\n\n\
             Requirements:\n\
             - Provide an hour-by-hour plan for each day.\n\
             - Include transport instructions (MRT/Bus/Taxi/Walking).\n\
             - Include food recommendations near attractions.\n\
             - Provide distance/time between places and maps/distance hints.\n\
             - Note opening/closing hours where relevant.\n\
             - Avoid backtracking geographically; optimize route order logically each day.\n\
             - End each day with a short summary and optional alternatives.\n\
             - Output in clean Markdown with headings, bullet points, and time blocks.\n",
            input.days,
            input.destination.trim(),
            travelers,
            interests
        )
    }
}

#[async_trait]
impl Tool for ItineraryBuilder {
    fn name(&self) -> &str {
        "build_itinerary"
    }

    fn description(&self) -> &str {
        "Generate a detailed AI-only travel itinerary as Markdown: daily schedule, transport, \
         food, distances and an optimized route order."
    }

    fn input_schema(&self) -> Value {
        parameters_schema::<ItineraryInput>()
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let input: ItineraryInput = parse_params(args)?;
        Self::validate(&input)?;

        info!(destination = %input.destination, days = input.days, "Building itinerary");
        let markdown = self
            .model
            .complete_text(&Self::user_prompt(&input))
            .await
            .map_err(|e| ToolError::Upstream(format!("Error generating itinerary: {}", e)))?;

        Ok(Value::String(markdown))
    }
}
