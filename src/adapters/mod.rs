pub mod dates;
pub mod flights_finder;
pub mod hotels_finder;
pub mod itinerary_builder;
pub mod schema;
pub mod sendgrid;
pub mod serpapi;
pub mod tool_registry;

#[cfg(test)]
mod itinerary_builder_test;
#[cfg(test)]
mod tool_registry_test;
