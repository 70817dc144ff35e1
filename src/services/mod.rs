//! Service layer for business logic
//!
//! The conversion pipeline lives here: goal resolution, broker
//! registration dispatch, the conversion status machine, webhook
//! ingestion and teaser dedup.

mod conversion_service;
mod goal_service;
mod registration_service;
mod teaser_service;
mod webhook_service;

pub use conversion_service::{ConversionService, StatusLabelMap};
pub use goal_service::GoalResolver;
pub use registration_service::{RegistrationOutcome, RegistrationRequest, RegistrationService};
pub use teaser_service::TeaserService;
pub use webhook_service::{
    ConversionReport, DEPOSIT_ERROR_TARGET, DepositOutcome, PROVIDER_ERROR_TARGET, WebhookService,
};
