//! SafeFlow command center: venue state, a quota-aware inference gateway and
//! the dashboard HTTP API that ties them together.

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod state;
#[doc(hidden)]
pub mod test_util;
pub mod transport;
pub mod venue;

pub use config::Config;
pub use gateway::{GatewaySettings, InferenceGateway, PeopleCount};
pub use state::AppState;
