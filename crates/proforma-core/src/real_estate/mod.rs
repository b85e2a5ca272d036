//! Levered hold model for a single commercial real-estate acquisition.
//!
//! The pieces run in a fixed order: the loan schedule does not depend on
//! NOI, the operating projection consumes the schedule, and the return
//! summary consumes the projection plus the terminal-year NOI and balance.

pub mod amortization;
pub mod cash_flow;
pub mod pro_forma;
pub mod returns;
