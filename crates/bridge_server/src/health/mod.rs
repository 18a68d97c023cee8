//! Upstream health tracking.
//!
//! The bridge cannot see the RCON socket itself, so the only health signal it
//! has is the stream of possible-timeout reports raised by failed forwards.
//! [`MonitoredUpstream`] counts those reports and asks the upstream to
//! reconnect when they pile up.

pub mod timeout_monitor;

pub use timeout_monitor::{MonitoredUpstream, TimeoutMonitor, TimeoutMonitorConfig};
