pub mod config;
pub mod domain_utils;
pub mod error;
pub mod normalization;
pub mod record;
pub mod report;
pub mod rules;
pub mod scorer;
pub mod server;

pub use config::{Config, RuleConfig};
pub use domain_utils::DomainUtils;
pub use error::DetectorError;
pub use record::EmailRecord;
pub use report::{BatchReport, ScoredEmail};
pub use scorer::{PhishingScorer, ScoreResult};
