pub mod conversion;
pub mod health;
pub mod registration;
pub mod teaser;
pub mod webhook;

pub use conversion::{ConversionApiService, conversion_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use registration::{RegistrationApiService, registration_routes};
pub use teaser::{TeaserApiService, teaser_routes};
pub use webhook::{WebhookApiService, webhook_routes};
