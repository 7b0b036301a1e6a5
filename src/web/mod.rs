pub mod analyze;
pub mod auth;
pub mod error;
pub mod guard;
pub mod history;
pub mod models;
pub mod pages;
pub mod responses;
pub mod router;
pub mod session;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use responses::ApiMessage;
pub use state::AppState;
