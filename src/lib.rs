//! # Wayfarer - conversational travel planner
//!
//! A tool-calling agent that searches flights and hotels, drafts itineraries, and, once the
//! traveller approves, turns the final plan into an HTML email.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wayfarer::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_file("wayfarer.toml")?;
//!     let agent = wayfarer::build_agent(&settings)?;
//!
//!     let round = agent.send_message("trip-1", "Flights from LIS to JFK on 2026-11-03").await?;
//!     println!("{}", round.answer);
//!     agent.resume("trip-1").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Wayfarer follows Hexagonal Architecture:
//! - **Domain**: ports (`Tool`, `DeliveryPort`) and delivery types
//! - **Agents**: conversation types, model adapter, orchestration loop, checkpoints
//! - **Adapters**: SerpAPI-backed tools, itinerary tool, SendGrid delivery
//! - **Config**: layered settings and validation

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::flights_finder::FlightsFinder;
use crate::adapters::hotels_finder::HotelsFinder;
use crate::adapters::itinerary_builder::ItineraryBuilder;
use crate::adapters::sendgrid::{LogDelivery, SendGridDelivery};
use crate::adapters::serpapi::{SearchBackend, SearchLocale, SerpApiClient};
use crate::adapters::tool_registry::ToolRegistry;
use crate::agents::core::{Envelope, Finalizer, LoopOptions, TravelAgent};
use crate::agents::events::EventBus;
use crate::agents::llm::{create_provider, LlmProvider};
use crate::agents::memory::{create_store, CheckpointStore};
use crate::agents::prompts::{tools_system_prompt, EMAIL_SYSTEM_PROMPT, ITINERARY_SYSTEM_PROMPT};
use crate::agents::ModelAdapter;
use crate::config::Settings;
use crate::domain::DeliveryPort;

/// External collaborators the agent is wired to
pub struct Collaborators {
    pub provider: Arc<dyn LlmProvider>,
    pub search: Arc<dyn SearchBackend>,
    pub delivery: Arc<dyn DeliveryPort>,
    pub store: Arc<dyn CheckpointStore>,
}

impl Collaborators {
    /// Real collaborators as described by the settings
    pub fn from_settings(settings: &Settings) -> Result<Self, anyhow::Error> {
        let delivery: Arc<dyn DeliveryPort> = if settings.email.enabled {
            Arc::new(SendGridDelivery::from_config(&settings.email)?)
        } else {
            Arc::new(LogDelivery)
        };

        Ok(Self {
            provider: create_provider(&settings.llm)?,
            search: Arc::new(SerpApiClient::from_config(&settings.search)?),
            delivery,
            store: create_store(&settings.memory)?,
        })
    }
}

/// Build the agent with the collaborators named in `settings`
pub fn build_agent(settings: &Settings) -> Result<TravelAgent, anyhow::Error> {
    let events = EventBus::new(settings.agent.event_buffer);
    assemble(settings, Collaborators::from_settings(settings)?, events)
}

/// Composition root: one adapter instance per model role, the three tools, the finalizer
pub fn assemble(
    settings: &Settings,
    collaborators: Collaborators,
    events: EventBus,
) -> Result<TravelAgent, anyhow::Error> {
    let Collaborators {
        provider,
        search,
        delivery,
        store,
    } = collaborators;

    let planner = ModelAdapter::new(
        provider.clone(),
        tools_system_prompt(),
        settings.llm.temperature,
        events.clone(),
    )
    .with_max_tokens(settings.llm.max_tokens);

    let itinerary = ModelAdapter::new(
        provider.clone(),
        ITINERARY_SYSTEM_PROMPT,
        settings.agent.itinerary_temperature,
        events.clone(),
    )
    .with_max_tokens(settings.llm.max_tokens);

    let email = ModelAdapter::new(
        provider,
        EMAIL_SYSTEM_PROMPT,
        settings.agent.finalization_temperature,
        events.clone(),
    )
    .with_max_tokens(settings.llm.max_tokens);

    let locale = SearchLocale::from(&settings.search);
    let max_results = settings.search.max_results;
    let registry = ToolRegistry::builder()
        .register(FlightsFinder::new(search.clone(), locale.clone(), max_results))?
        .register(HotelsFinder::new(search, locale, max_results))?
        .register(ItineraryBuilder::new(itinerary))?
        .build();

    let envelope = Envelope {
        sender: settings.email.from.clone(),
        recipient: settings.email.to.clone(),
        subject: settings.email.subject.clone(),
    };
    let finalizer = Finalizer::new(email, envelope, delivery, events.clone());

    let options = LoopOptions {
        max_tool_rounds: settings.agent.max_tool_rounds,
        tool_timeout: Duration::from_secs(settings.agent.tool_timeout_seconds),
    };

    tracing::info!(
        provider = %planner.provider().name(),
        model = %planner.provider().model(),
        tools = ?registry.names(),
        "Travel agent assembled"
    );

    Ok(TravelAgent::new(planner, registry, finalizer, store, events, options))
}
