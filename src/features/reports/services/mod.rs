mod export_service;
mod filter_service;
mod geocoding_service;
mod lifecycle_service;
mod render_service;

pub use export_service::ExportService;
pub use filter_service::{apply_filters, DateFilter, FilterConfig};
pub use geocoding_service::GeocodingService;
pub use lifecycle_service::LifecycleService;
pub use render_service::RenderService;
