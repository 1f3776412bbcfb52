// src/config/mod.rs
pub mod ai;
pub mod app;
pub mod sectors;

pub use ai::AiConfig;
pub use app::AppSettings;
pub use sectors::{Sector, SectorCatalog};
