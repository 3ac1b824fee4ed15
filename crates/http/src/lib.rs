//! # birdbook-http
//!
//! Client side of the birdbook API.
//!
//! [`FarmClient`] wraps the REST calls. [`Workspace`] holds what an
//! interactive front end needs: the cached lists ([`DataCache`]), one entry
//! form per record type ([`FormState`]) and the save and delete flows.
//! Every mutation is followed by a full refetch of all three lists.

mod cache;
mod client;
mod form;
mod workspace;

pub use cache::DataCache;
pub use client::{FarmClient, API_URL_VAR, DEFAULT_API_URL};
pub use form::FormState;
pub use workspace::{Confirm, Resource, Workspace, SAVE_FAILED};
