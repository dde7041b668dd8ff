//! Notion API access
//!
//! - `client`: paginated HTTP client, also the production child loader
//! - `page`: query result rows and their cover
//! - `record`: typed problem records mapped from page properties

mod client;
mod page;
mod record;

pub use client::NotionClient;
pub use page::{FileRef, Page, UrlHolder};
pub use record::{validate_records, Difficulty, ProblemRecord};
