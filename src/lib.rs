mod authorization;
pub mod clock;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod telemetry;
pub mod token;
pub mod types;

pub use authorization::{AccessToken, Authorization};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigLocation, read_config};
pub use endpoint::{EndpointResponse, HttpEndpoint, TokenEndpoint};
pub use errors::Error;
pub use token::{Credentials, RefreshOutcome, RefreshPolicy, TokenPhase, TokenSnapshot};
