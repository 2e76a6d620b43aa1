pub mod alert;
pub mod cli;
pub mod crawler;
pub mod error;
pub mod logging;
pub mod models;
pub mod scraper_logic;
pub mod settings;
pub mod static_scraper;

pub use error::{Result, ScraperError};
pub use models::{CategoryMap, Direction, Notification, StockRow, StockTable};
