// === PUBLIC CONTRACT ===
// Only the contract module should be public for other modules to consume
pub mod contract;

// Re-export the public contract components
pub use contract::{client, error, model, time};

// === MODULE WIRING ===
pub mod module;
pub use module::{migrate, ClinicSchedule};

// === INTERNAL MODULES ===
// Exposed for the server binary wiring and for tests.
// External consumers should stick to `contract`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
