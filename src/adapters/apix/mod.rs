//! APIX legacy endpoint integration
//!
//! APIX is the REST front of the legacy catalog. This module builds its URLs,
//! executes calls and turns response codes into control numbers or errors.

pub mod client;
pub mod request;

pub use client::{ApixClient, APIX_CONTENT_TYPE};
pub use request::{ApixMethod, ApixRequest, ApixUrls};
