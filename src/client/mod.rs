//! External broker-selection collaborator
//!
//! The conversion core never talks to broker APIs directly; it goes
//! through `BrokerGateway`, with the provider order supplied by an
//! injected `BrokerSelectionStrategy`.

mod broker;
mod strategy;

pub use broker::{BrokerGateway, BrokerReply, BrokerReplyStatus, HttpBrokerGateway};
pub use strategy::{BrokerProvider, BrokerSelectionStrategy, ConfiguredOrderStrategy};
