pub mod algorithm;
pub mod battery;
pub mod config;
pub mod error;
pub mod result;
pub mod series;
pub mod window;

pub use algorithm::{Algorithm, UnknownAlgorithm};
pub use battery::BatteryConfig;
pub use config::{ConfigError, PlannerConfig, SearchConfig};
pub use error::OptimizeError;
pub use result::{Cycle, CyclePair, TradePlan, TransactionResult};
pub use series::{CsvError, PriceSeries, PriceTick, SeriesError};
pub use window::TradeWindow;
