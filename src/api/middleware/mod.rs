pub mod auth;
pub mod request_id;

pub use auth::{AdvertiserAuth, AdvertiserIdentity, WebhookAuth};
pub use request_id::{RequestId, RequestIdMiddleware};
