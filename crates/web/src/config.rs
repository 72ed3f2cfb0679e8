use std::{env, fmt::Display, str::FromStr, time::Duration};

use route_planning::{
    explainer::ExplainerOptions, geocoder::GeocoderOptions, matrix::MatrixOptions,
    optimizer::OptimizerOptions,
};

pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_address: var("BIND_ADDRESS")
                .filter(|address| !address.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned()),
            port: parse(&var, "PORT").unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Tunables of the planning components. Anything unset keeps its default.
#[derive(Debug, Clone, Default)]
pub struct PlanningConfig {
    pub geocoder: GeocoderOptions,
    /// How long a geocoded address stays cached, `None` for the lifetime of
    /// the process.
    pub cache_ttl: Option<Duration>,
    pub matrix: MatrixOptions,
    pub optimizer: OptimizerOptions,
    pub explainer: ExplainerOptions,
}

impl PlanningConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let geocoder = &mut config.geocoder;
        if let Some(millis) = parse(&var, "GEOCODE_MIN_INTERVAL_MS") {
            geocoder.min_interval = Duration::from_millis(millis);
        }
        if let Some(concurrency) = parse::<usize>(&var, "GEOCODE_MAX_CONCURRENCY") {
            geocoder.max_concurrency = concurrency.max(1);
        }
        if let Some(secs) = parse(&var, "GEOCODE_TIMEOUT_SECS") {
            geocoder.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse::<u32>(&var, "GEOCODE_MAX_ATTEMPTS") {
            geocoder.max_attempts = attempts.max(1);
        }
        config.cache_ttl = parse::<u64>(&var, "GEOCODE_CACHE_TTL_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        if let Some(secs) = parse(&var, "MATRIX_TIMEOUT_SECS") {
            config.matrix.timeout = Duration::from_secs(secs);
        }
        if let Some(elements) = parse::<usize>(&var, "MATRIX_MAX_ELEMENTS") {
            config.matrix.max_elements = elements.max(1);
        }

        let sequencer = &mut config.optimizer.sequencer;
        if let Some(iterations) = parse::<usize>(&var, "TWO_OPT_ITERATIONS") {
            sequencer.two_opt = iterations > 0;
            sequencer.two_opt_iterations = iterations;
        }
        if let Some(closed) = parse(&var, "ROUTE_RETURN_TO_ORIGIN") {
            sequencer.return_to_origin = closed;
        }

        if let Some(secs) = parse(&var, "EXPLAINER_TIMEOUT_SECS") {
            config.explainer.timeout = Duration::from_secs(secs);
        }

        config
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = var(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring {name}='{raw}': {e}");
            None
        }
    }
}
