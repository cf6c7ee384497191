pub mod clients;
pub mod guards;
pub mod model;
pub mod service;

pub use clients::{AuthGateway, AuthGatewayClient};
pub use guards::RequireAdmin;
pub use service::SessionService;
