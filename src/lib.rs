//! Afftrack - affiliate conversion-tracking backend
//!
//! This library links traffic clicks to downstream advertiser outcomes
//! (broker registration, deposit, payout) and reports them as billable
//! conversions.
//!
//! # Architecture
//! - `services`: the conversion pipeline — goal resolution, broker
//!   dispatch, the conversion status machine, webhook ingestion and
//!   teaser dedup
//! - `storage`: SeaORM-backed repositories for clicks, goals,
//!   transactions, registrations and conversions
//! - `cache`: content-hash dedup cache (moka / redis)
//! - `client`: the external broker-selection collaborator
//! - `api`: HTTP services, middleware and token handling
//! - `config`: configuration management

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod services;
pub mod storage;
pub mod utils;
