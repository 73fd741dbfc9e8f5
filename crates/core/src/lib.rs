//! Core library for the Lumière media upload pipeline.
//!
//! Models the client-side life of a media upload: files are screened at
//! intake, held as ordered entries while their metadata is edited, validated
//! as a whole, then driven through a simulated transfer one at a time. No
//! real network or storage is involved; transfers are simulated with
//! configurable randomness so the surrounding machinery (state transitions,
//! progress reporting, failure handling, resource cleanup) can be exercised
//! end to end.

pub mod config;
pub mod events;
pub mod testing;
pub mod upload;
