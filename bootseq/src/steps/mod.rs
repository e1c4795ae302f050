//! Concrete bootstrap steps.
//!
//! Each step is idempotent: running it against an already provisioned
//! environment succeeds and reports which branch it took.

pub mod api_keys;
pub mod app;
pub mod database;
pub mod directories;
pub mod secret;

pub use api_keys::ReportApiKeys;
pub use app::{ApplyMigrations, CollectStatic, CreateSuperuser, InstallDependencies};
pub use database::WaitForDatabase;
pub use directories::EnsureDirectories;
pub use secret::EnsureSecretKey;
