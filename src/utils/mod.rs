pub mod config;
pub mod duration;
pub mod logger;
pub mod output;

pub use config::{AnalysisConfig, AppConfig, DatasetConfig, DetectionMethodsConfig, LoggingConfig};
pub use duration::{parse_duration, DurationError};
pub use logger::{init_from_config, init_logger};
pub use output::{validate_input_file, validate_output_file, write_json};
