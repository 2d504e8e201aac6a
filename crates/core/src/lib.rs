pub mod config;
pub mod decision;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{PodAdsError, PodAdsResult};
