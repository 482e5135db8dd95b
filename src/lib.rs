//! Client-side orchestration for an AI smart-contract agent on Algorand.
//!
//! Three cooperating components built around observable state:
//! - [`app::WalletSessionManager`] owns the single wallet session and
//!   classifies provider failures at the boundary
//! - [`app::PaymentFlow`] runs the deployment payment end to end with
//!   observable phases and a single immutable outcome per attempt
//! - [`app::TaskTracker`] submits generation prompts and polls the
//!   backend for status snapshots at a fixed cadence
//!
//! All observable state is published through `tokio::sync::watch`
//! channels, so any number of subscribers see the latest value on
//! subscription plus every subsequent change.

pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
