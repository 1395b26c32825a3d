//! Type definitions for the environmental quality service

pub mod category;
pub mod readings;
pub mod report;

pub use category::{AqiBand, Category, CategoryScheme};
pub use readings::{AirReadings, Domain, EqsRequest, SoilReadings, WaterReadings};
pub use report::{DomainReport, EqsReport, NarrativeStatus};
