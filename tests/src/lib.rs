//! # Sensor Hub Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Dispatch throughput (criterion)
//! └── src/integration/  # End-to-end flows over the in-process broker
//!     ├── hub_flows.rs  # Broker → IngestLoop → registry → options reply
//!     └── lifecycle.rs  # Node lifecycle properties across many messages
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hub-tests
//! cargo test -p hub-tests integration::lifecycle::
//! cargo bench -p hub-tests
//! ```

pub mod integration;
