//! Dependency injection providers for service management.
//!
//! [`LightingContextProvider`] builds the shared state at startup and
//! [`ZoneServiceProvider`] turns it into one control task per zone.

pub mod lighting;
pub mod traits;
pub mod zone;

pub use lighting::LightingContextProvider;
pub use traits::{AsyncProvider, ServiceProvider};
pub use zone::ZoneServiceProvider;
