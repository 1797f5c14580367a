//! HTTP API endpoints

pub mod admin;
pub mod auth;
pub mod health;
pub mod model;
pub mod tracks;
pub mod upload;

pub use admin::admin_routes;
pub use auth::auth_routes;
pub use health::health_routes;
pub use model::model_routes;
pub use tracks::track_routes;
pub use upload::upload_routes;
