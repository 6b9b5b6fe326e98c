//! Behaviour tests for the role sync engine and dispatcher.
//!
//! - `harness.rs`    - Fixture registry, FakePlatform and event builders
//! - `selection.rs`  - Selecting, switching and dropping category roles
//! - `exclusion.rs`  - One role per category under arbitrary event sequences
//! - `filtering.rs`  - Events that must not touch the platform
//! - `tos.rs`        - Terms-of-service gate
//! - `failures.rs`   - Platform failures, timeouts and recovery
//! - `dispatch.rs`   - Per-member ordering and cross-member parallelism

mod exclusion;
