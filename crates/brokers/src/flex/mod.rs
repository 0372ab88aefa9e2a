//! Report-polling client for the brokerage Flex statement service.
//!
//! The Flex protocol is asynchronous and report-based: the client submits
//! a generation request, receives a reference code, then polls a second
//! endpoint until the generated report is ready. Generation latency is
//! unpredictable, so the polling loop is bounded and fails closed.
//!
//! # Protocol phases
//!
//! 1. **Requesting**: `SendRequest` with the account token and the saved
//!    query id; the response carries a reference code or an error code.
//! 2. **Polling**: `GetStatement` with the reference code at a fixed
//!    interval, up to a bounded number of attempts.
//! 3. **Parsing**: the ready report is a flat list of self-closing
//!    attribute records (open positions plus a cash report section).
//!
//! Each phase transition is classified by a pure function in [`protocol`],
//! so every terminal condition and the attempt bound are independently
//! testable.

mod client;
mod models;
mod parser;
mod protocol;
mod transport;

pub use client::{FlexClient, FlexConfig};
pub use models::{FlexCashBalances, FlexPosition, FlexStatement};
pub use protocol::{PollOutcome, RequestOutcome};
pub use transport::{FlexTransport, HttpFlexTransport};

/// Broker identifier used in errors and stored entities.
pub const BROKER_ID: &str = "IBKR_FLEX";
