//! FX Hourly Signal Engine
//!
//! Fetches recent hourly candles for a basket of currency pairs, trains a
//! fresh gradient-boosted classifier per pair on every run and emits a
//! BUY/SELL recommendation with a price plan for each pair whose model
//! clears the accuracy gate.
//!
//! ## Architecture
//!
//! ```text
//! KeyRotator → PriceSource (Twelve Data) → Features → Balance → Train + CV
//!                                                                  ↓
//!                       Report ← Predictor (confidence, plan) ← Quality Gate
//!                                     ↑
//!                          Explain (top features, consensus only)
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod ml;
pub mod types;
