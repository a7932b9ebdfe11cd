#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod dashboard;
pub mod error;
pub mod interaction;
pub mod playback;
pub mod progress_store;

pub use portal_core::Clock;

pub use app_services::PortalServices;
pub use catalog_service::CatalogService;
pub use dashboard::{
    Dashboard, DashboardSection, DashboardService, MaterialTile, TileGroup, build_dashboard,
};
pub use error::{CatalogError, PortalServicesError};
pub use interaction::{OpenOutcome, lock_message, open_material};
pub use playback::{PlaybackConfig, VideoPlayback};
pub use progress_store::{MaterialProgress, ProgressStore};
