// Scenario configuration

use crate::ndn_error::{require_positive, SimError, SimResult};
use crate::ndn_interface::{DEFAULT_HOP_BUDGET, DEFAULT_PAYLOAD_SIZE, DEFAULT_PREFIX};
use crate::ndn_topology::{BuiltTopology, TopologyBuilder};

// ============================================================================
// Main Configuration
// ============================================================================

/// Parameters of one churn / producer-failure experiment
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Size of the content universe
    pub num_contents: u64,

    /// Connect arrivals per second
    pub connection_rate: f64,

    /// Per-session disconnect rate
    pub disconnection_rate: f64,

    /// Length of the initialization period (seconds); the producer fails at its end
    pub initialization_period_length: f64,

    /// Length of the observation period (seconds)
    pub observation_period_length: f64,

    /// Zipf-Mandelbrot exponent s
    pub zipf_exponent: f64,

    /// Zipf-Mandelbrot rank shift q
    pub zipf_shift: f64,

    /// Content store capacity of infrastructure nodes
    pub cache_size: usize,

    /// Hop budget of every flood
    pub hop_budget: u32,

    /// Delay of the first arrival of each period (seconds)
    pub first_arrival_offset: f64,

    /// Name prefix served by the producer
    pub prefix: String,

    pub payload_size: u32,

    /// Random seed for reproducibility
    pub seed: Option<u64>,

    /// Keep the full event log in the result
    pub record_events: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            num_contents: 100,
            connection_rate: 1.0,
            disconnection_rate: 0.05,
            initialization_period_length: 100.0,
            observation_period_length: 100.0,
            zipf_exponent: 0.8,
            zipf_shift: 0.0,
            cache_size: 10,
            hop_budget: DEFAULT_HOP_BUDGET,
            first_arrival_offset: 0.2,
            prefix: DEFAULT_PREFIX.to_string(),
            payload_size: DEFAULT_PAYLOAD_SIZE,
            seed: None,
            record_events: true,
        }
    }
}

impl ScenarioConfig {
    /// Reject parameters that make the experiment meaningless.
    /// Called before any event is scheduled.
    pub fn validate(&self) -> SimResult<()> {
        if self.num_contents == 0 {
            return Err(SimError::InvalidDomain {
                parameter: "num_contents",
                value: 0.0,
            });
        }
        if self.cache_size == 0 {
            return Err(SimError::CapacityViolation { capacity: 0 });
        }
        require_positive("connection_rate", self.connection_rate)?;
        require_positive("disconnection_rate", self.disconnection_rate)?;
        require_positive("zipf_exponent", self.zipf_exponent)?;
        require_positive("initialization_period_length", self.initialization_period_length)?;
        non_negative("observation_period_length", self.observation_period_length)?;
        non_negative("zipf_shift", self.zipf_shift)?;
        non_negative("first_arrival_offset", self.first_arrival_offset)?;
        if self.prefix.is_empty() || !self.prefix.starts_with('/') {
            return Err(SimError::InvalidDomain {
                parameter: "prefix",
                value: f64::NAN,
            });
        }
        Ok(())
    }

    /// End of the whole run: initialization plus observation
    pub fn horizon(&self) -> f64 {
        self.initialization_period_length + self.observation_period_length
    }

    pub fn summary(&self) -> String {
        format!(
            "contents: {}, cache: {}, rates: con={} dis={}, zipf: s={} q={}, periods: {}+{}s, hops: {}",
            self.num_contents,
            self.cache_size,
            self.connection_rate,
            self.disconnection_rate,
            self.zipf_exponent,
            self.zipf_shift,
            self.initialization_period_length,
            self.observation_period_length,
            self.hop_budget
        )
    }
}

fn non_negative(parameter: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidDomain { parameter, value })
    }
}

// ============================================================================
// Topology selection
// ============================================================================

/// Which built-in topology a scenario runs on
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    /// rows x cols router grid, one consumer per router, producer on the last
    Grid { rows: usize, cols: usize },
    /// consumer - routers - producer
    Line { routers: usize },
}

impl Default for TopologySpec {
    fn default() -> Self {
        TopologySpec::Grid { rows: 3, cols: 3 }
    }
}

impl TopologySpec {
    pub fn build(&self) -> SimResult<BuiltTopology> {
        match *self {
            TopologySpec::Grid { rows, cols } => TopologyBuilder::grid(rows, cols),
            TopologySpec::Line { routers } => TopologyBuilder::line(routers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ScenarioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hop_budget, DEFAULT_HOP_BUDGET);
        assert_eq!(config.horizon(), 200.0);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ScenarioConfig::default();
        config.cache_size = 0;
        assert_eq!(
            config.validate(),
            Err(SimError::CapacityViolation { capacity: 0 })
        );

        let mut config = ScenarioConfig::default();
        config.connection_rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidDomain { parameter: "connection_rate", .. })
        ));

        let mut config = ScenarioConfig::default();
        config.num_contents = 0;
        assert!(config.validate().is_err());

        let mut config = ScenarioConfig::default();
        config.prefix = "prefix".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_with_partial_fields() {
        let yaml = r#"
num_contents: 50
connection_rate: 2.5
cache_size: 4
seed: 7
"#;
        let config: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.num_contents, 50);
        assert_eq!(config.connection_rate, 2.5);
        assert_eq!(config.cache_size, 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.prefix, "/prefix");
        assert_eq!(config.first_arrival_offset, 0.2);
    }

    #[test]
    fn test_topology_spec_yaml() {
        let spec: TopologySpec = serde_yaml::from_str("kind: line\nrouters: 2\n").unwrap();
        assert_eq!(spec, TopologySpec::Line { routers: 2 });
        let spec: TopologySpec = serde_yaml::from_str("kind: grid\nrows: 2\ncols: 4\n").unwrap();
        assert_eq!(spec, TopologySpec::Grid { rows: 2, cols: 4 });
    }
}
