//! Metric extraction, refresh coordination, and sensors on top of `solax-api`.
//!
//! - **[`Coordinator`]**: Polls one [`MetricSource`] on an interval, holds
//!   the latest [`EndpointState`], and notifies subscribers after every poll.
//!   A failed startup poll is [`CoreError::NotReady`]; a failed scheduled
//!   poll only marks the data stale.
//!
//! - **[`Sensor`]**: Read-only, unit-tagged view of one [`Metric`] fed by a
//!   coordinator's `watch` channel.
//!
//! - **[`extract`]**: Turns validated battery, inverter, and real-time
//!   payloads into a [`MetricSnapshot`].
//!
//! - **[`Integration`]** / **[`setup_site`]**: Builds coordinators and
//!   sensors per configured site, in the shared or independent [`Topology`].
//!
//! - **[`ConfigFlow`]**: Validates and probes a new site entry.

pub mod config_flow;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod integration;
pub mod model;
pub mod sensor;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config_flow::{AbortReason, ConfigFlow, EntryData, FlowError, FlowResult, UserInput};
pub use coordinator::{Coordinator, DEFAULT_SCAN_INTERVAL, EndpointState, PollContext};
pub use error::CoreError;
pub use integration::{Integration, SiteConfig, SiteHandle, SiteTarget, Topology, setup_site};
pub use model::{Metric, MetricSnapshot, SensorDescriptor};
pub use sensor::{Sensor, SensorReading};
pub use source::{CloudSource, LocalSource, MetricSource, SiteSource};
