pub mod presence;
pub mod server_admin;
pub mod welcome;

pub use presence::Presence;
pub use server_admin::SalonLedger;
pub use welcome::{WelcomeSettings, WelcomeStore};
