//! # Ports
//!
//! - `inbound`: the API the hub runtime drives.
//! - `outbound`: the collaborators the service is injected with.

pub mod inbound;
pub mod outbound;
