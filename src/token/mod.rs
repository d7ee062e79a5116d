mod credentials;
mod guard;
mod outcome;
mod policy;
mod snapshot;

pub use credentials::Credentials;
pub use guard::TokenCache;
pub use outcome::RefreshOutcome;
pub use policy::RefreshPolicy;
pub use snapshot::{TokenPhase, TokenSnapshot};
