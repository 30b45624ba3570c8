//! Catalog core types and utilities

pub mod config;
pub mod error;
pub mod page;

pub use config::{ApiConfig, AuthConfig, CatalogConfig, NotificationConfig, RegionalConfig};
pub use error::{CoreError, CoreResult};
pub use page::{Direction, Page, PageRequest, SortOrder};
