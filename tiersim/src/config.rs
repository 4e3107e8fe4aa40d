//! Configuration

// Imports
use {
	crate::{
		addr::Geometry,
		policies::{aging, aging::multi_queue, counter_swap, Aging, CounterSwap},
		sim::Policy,
	},
	anyhow::Context,
};

/// Configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
	/// Debug output period (in seconds)
	#[serde(default = "default_debug_output_period_secs")]
	pub debug_output_period_secs: f64,

	/// Geometry
	#[serde(default)]
	pub geometry: GeometryConfig,

	/// Placement policy
	#[serde(default)]
	pub policy: PolicyConfig,
}

impl Config {
	/// Validates this configuration.
	///
	/// # Errors
	/// Returns an error describing the first invalid setting.
	pub fn validate(&self) -> Result<(), anyhow::Error> {
		anyhow::ensure!(
			self.debug_output_period_secs.is_finite() && self.debug_output_period_secs >= 0.0,
			"Debug output period must be a non-negative number of seconds, found {}",
			self.debug_output_period_secs
		);
		self.geometry().context("Invalid geometry")?;
		self.policy.validate().context("Invalid policy")?;

		Ok(())
	}

	/// Builds the geometry
	pub fn geometry(&self) -> Result<Geometry, anyhow::Error> {
		Geometry::new(
			self.geometry.cache_line_size,
			self.geometry.fast_capacity,
			self.geometry.slow_capacity,
		)
	}

	/// Builds the configured policy
	pub fn build_policy(&self, geometry: Geometry) -> Result<Box<dyn Policy>, anyhow::Error> {
		self.policy.validate().context("Invalid policy")?;

		let policy: Box<dyn Policy> = match self.policy {
			PolicyConfig::CounterSwap(config) => Box::new(CounterSwap::new(geometry, counter_swap::Config {
				promotion_threshold: config.promotion_threshold as i8,
				counter_floor:       config.counter_floor,
			})),
			PolicyConfig::Aging(config) => Box::new(Aging::new(geometry, aging::Config {
				migration_cost: config.migration_cost,
				mq_length:      config.mq_length,
				life_time:      config.life_time,
				hot_level:      config.hot_level,
			})),
		};

		Ok(policy)
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			debug_output_period_secs: self::default_debug_output_period_secs(),
			geometry:                 GeometryConfig::default(),
			policy:                   PolicyConfig::default(),
		}
	}
}

fn default_debug_output_period_secs() -> f64 {
	1.0
}

/// Geometry configuration
#[derive(Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct GeometryConfig {
	/// Cache line size, in bytes
	pub cache_line_size: u64,

	/// Fast tier capacity, in bytes
	pub fast_capacity: u64,

	/// Slow tier capacity, in bytes
	pub slow_capacity: u64,
}

impl Default for GeometryConfig {
	fn default() -> Self {
		Self {
			cache_line_size: 64,
			fast_capacity:   1 << 30,
			slow_capacity:   4 << 30,
		}
	}
}

/// Policy configuration
#[derive(Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PolicyConfig {
	/// Counter-swap
	CounterSwap(CounterSwapConfig),

	/// Aging
	Aging(AgingConfig),
}

impl PolicyConfig {
	/// Validates this configuration
	pub fn validate(&self) -> Result<(), anyhow::Error> {
		match *self {
			Self::CounterSwap(config) => anyhow::ensure!(
				(1..=i8::MAX as u8).contains(&config.promotion_threshold),
				"Promotion threshold must be within 1..={}, found {}",
				i8::MAX,
				config.promotion_threshold
			),
			Self::Aging(config) => {
				anyhow::ensure!(config.migration_cost != 0, "Migration cost must be non-zero");
				anyhow::ensure!(config.life_time != 0, "Life time must be non-zero");
				anyhow::ensure!(
					(1..=multi_queue::MAX_LEVELS).contains(&config.mq_length),
					"Multi-queue length must be within 1..={}, found {}",
					multi_queue::MAX_LEVELS,
					config.mq_length
				);
				anyhow::ensure!(
					config.hot_level < config.mq_length,
					"Hot level ({}) must be below the multi-queue length ({})",
					config.hot_level,
					config.mq_length
				);
			},
		}

		Ok(())
	}
}

impl Default for PolicyConfig {
	fn default() -> Self {
		Self::CounterSwap(CounterSwapConfig::default())
	}
}

/// Counter-swap configuration
#[derive(Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct CounterSwapConfig {
	/// Counter value at which a migration is triggered
	#[serde(default = "default_promotion_threshold")]
	pub promotion_threshold: u8,

	/// Lowest value the counter saturates at
	#[serde(default)]
	pub counter_floor: counter_swap::CounterFloor,
}

impl Default for CounterSwapConfig {
	fn default() -> Self {
		Self {
			promotion_threshold: self::default_promotion_threshold(),
			counter_floor:       counter_swap::CounterFloor::default(),
		}
	}
}

fn default_promotion_threshold() -> u8 {
	16
}

/// Aging configuration
#[derive(Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AgingConfig {
	/// Migration cost, in cycles
	pub migration_cost: u64,

	/// Number of multi-queue levels
	pub mq_length: usize,

	/// Cycles a line may go untouched before being demoted
	pub life_time: u64,

	/// Level at which accessed lines are migrated
	pub hot_level: usize,
}

impl Default for AgingConfig {
	fn default() -> Self {
		Self {
			migration_cost: 1000,
			mq_length:      8,
			life_time:      10_000,
			hot_level:      3,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_valid() {
		let config = Config::default();
		config.validate().unwrap();

		let geometry = config.geometry().unwrap();
		assert_eq!(geometry.num_fast_slots(), 1 << 24);
		assert_eq!(geometry.slow_per_fast(), 4);
	}

	#[test]
	fn parses_counter_swap() {
		let config = serde_json::from_str::<Config>(
			r#"{
				"geometry": { "cache_line_size": 64, "fast_capacity": 1024, "slow_capacity": 4096 },
				"policy": { "kind": "counter-swap", "promotion_threshold": 4, "counter_floor": "i8-min" }
			}"#,
		)
		.unwrap();
		config.validate().unwrap();

		match config.policy {
			PolicyConfig::CounterSwap(policy) => {
				assert_eq!(policy.promotion_threshold, 4);
				assert_eq!(policy.counter_floor, counter_swap::CounterFloor::I8Min);
			},
			policy => panic!("Expected counter-swap, found {policy:?}"),
		}
		assert_eq!(config.debug_output_period_secs, 1.0);
	}

	#[test]
	fn parses_aging() {
		let config = serde_json::from_str::<Config>(
			r#"{ "policy": { "kind": "aging", "migration_cost": 100, "mq_length": 4, "life_time": 50, "hot_level": 2 } }"#,
		)
		.unwrap();
		config.validate().unwrap();
		assert!(matches!(config.policy, PolicyConfig::Aging(AgingConfig { mq_length: 4, .. })));
	}

	#[test]
	fn parses_bundled_configs() {
		for config in [
			include_str!("../../resources/config/counter-swap.json"),
			include_str!("../../resources/config/aging.json"),
		] {
			let config = serde_json::from_str::<Config>(config).unwrap();
			config.validate().unwrap();
		}
	}

	#[test]
	fn rejects_bad_settings() {
		let mut config = Config::default();
		config.geometry.fast_capacity = 3 << 20;
		assert!(config.validate().is_err());

		let mut config = Config::default();
		config.policy = PolicyConfig::CounterSwap(CounterSwapConfig {
			promotion_threshold: 128,
			counter_floor:       counter_swap::CounterFloor::Zero,
		});
		assert!(config.validate().is_err());

		let mut config = Config::default();
		config.policy = PolicyConfig::Aging(AgingConfig {
			hot_level: 8,
			..AgingConfig::default()
		});
		assert!(config.validate().is_err());

		let mut config = Config::default();
		config.policy = PolicyConfig::Aging(AgingConfig {
			life_time: 0,
			..AgingConfig::default()
		});
		assert!(config.validate().is_err());

		let mut config = Config::default();
		config.policy = PolicyConfig::Aging(AgingConfig {
			migration_cost: 0,
			..AgingConfig::default()
		});
		assert!(config.validate().is_err());
	}
}
