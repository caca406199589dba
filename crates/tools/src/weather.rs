//! Weather lookup over a fixed city table.
//!
//! Deterministic so the loop can be exercised end-to-end without network
//! access. Unknown cities get a generic mild-weather reply.

use agentloop_core::error::ToolError;
use agentloop_core::message::Message;
use agentloop_core::tool::{ParamType, ToolRegistry, ToolSchema};
use serde::Deserialize;
use tracing::debug;

use crate::scenario::{Scenario, ScenarioInput};

/// (lowercase city, temperature, condition)
const CITIES: &[(&str, &str, &str)] = &[
    ("nyc", "58°F", "Partly cloudy"),
    ("new york", "58°F", "Partly cloudy"),
    ("london", "48°F", "Rainy"),
    ("san francisco", "62°F", "Sunny"),
    ("beijing", "45°F", "Hazy"),
    ("tokyo", "55°F", "Clear"),
    ("paris", "50°F", "Overcast"),
    ("sydney", "75°F", "Sunny"),
];

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    city: String,
}

/// Describe the current weather in `city`.
pub fn current_weather(city: &str) -> String {
    let city = city.trim();
    let key = city.to_lowercase();
    let title = title_case(city);

    match CITIES.iter().find(|(name, _, _)| *name == key) {
        Some((_, temp, condition)) => format!(
            "The current weather in {title} is {temp} and {}.",
            condition.to_lowercase()
        ),
        None => format!("The current weather in {title} is approximately 65°F with clear skies."),
    }
}

/// Uppercase the first letter of every word, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = ch != '\'';
        }
    }
    out
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register_fn(
        ToolSchema::new("get_weather", "Get the current weather for a specified city.").required(
            "city",
            ParamType::String,
            "The name of the city to get weather for (e.g., 'London', 'NYC', 'Beijing')",
        ),
        |a: WeatherArgs| async move {
            if a.city.trim().is_empty() {
                return Err(ToolError::failed("city must not be empty"));
            }
            debug!(city = %a.city, "get_weather");
            Ok(current_weather(&a.city))
        },
    )?;
    Ok(())
}

pub struct WeatherScenario;

impl Scenario for WeatherScenario {
    type Context = ();

    const NAME: &'static str = "weather";
    const DESCRIPTION: &'static str = "Current weather for a handful of cities";

    fn registry() -> Result<ToolRegistry, ToolError> {
        let mut registry = ToolRegistry::new();
        register(&mut registry)?;
        Ok(registry)
    }

    fn system_prompt(_context: &()) -> String {
        "You are a helpful assistant. Use the get_weather tool to answer questions \
         about the weather."
            .into()
    }

    fn demo() -> ScenarioInput<()> {
        ScenarioInput {
            context: (),
            messages: vec![Message::user("What's the weather like in London and Tokyo?")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_cities() {
        assert_eq!(
            current_weather("london"),
            "The current weather in London is 48°F and rainy."
        );
        assert_eq!(
            current_weather("  San Francisco "),
            "The current weather in San Francisco is 62°F and sunny."
        );
        assert_eq!(
            current_weather("NYC"),
            "The current weather in Nyc is 58°F and partly cloudy."
        );
    }

    #[test]
    fn unknown_city_gets_default() {
        assert_eq!(
            current_weather("reykjavik"),
            "The current weather in Reykjavik is approximately 65°F with clear skies."
        );
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("rio de JANEIRO"), "Rio De Janeiro");
        assert_eq!(title_case("st. john's"), "St. John's");
    }

    #[tokio::test]
    async fn tool_rejects_blank_city() {
        let registry = WeatherScenario::registry().unwrap();
        let tool = registry.resolve("get_weather").unwrap();
        assert!(tool.handler.call(json!({"city": " "})).await.is_err());
        assert_eq!(
            tool.handler.call(json!({"city": "Tokyo"})).await.unwrap(),
            "The current weather in Tokyo is 55°F and clear."
        );
    }
}
