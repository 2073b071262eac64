//! Async HTTP client for SolaX telemetry endpoints.
//!
//! Two API surfaces are covered:
//!
//! - **Cloud site lists** ([`SiteList::Battery`], [`SiteList::Inverter`]):
//!   `GET {base}/api/v1/site/{ListType}/{site_id}?token={token}` on the
//!   SolaX portal.
//! - **Local real-time data**: `GET http://{ip}:{port}/api/realTimeData.htm`
//!   served directly by the inverter's Wi-Fi dongle.
//!
//! Every response is decoded once at the network boundary into typed
//! structures ([`schema`]); callers never see raw JSON. Timeouts are retried
//! with a `0, 5, 15, 35, …` backoff ([`RetryPolicy`]); every other failure
//! is returned immediately.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod retry;
pub mod schema;
pub mod transport;

pub use client::SolaxClient;
pub use endpoint::{Credentials, DEFAULT_BASE_URL, LocalTarget, SiteList};
pub use error::{Error, SchemaError};
pub use retry::{Backoff, RetryPolicy};
pub use schema::{BatteryResponse, DataEntry, InverterResponse, RealTimeData, SiteResponse};
pub use transport::{TlsMode, TransportConfig};
