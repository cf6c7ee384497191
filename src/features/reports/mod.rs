pub mod clients;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use services::{
    ExportService, GeocodingService, LifecycleService, RenderService,
};
pub use workers::FeedWorker;
