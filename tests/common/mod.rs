//! Common test utilities and fixtures
//!
//! Shared mock implementations and builders for the inventory poller
//! test suite: an in-process scripted `VimSession`, a wiremock-backed
//! vCenter VI/JSON endpoint, and canned inventory data.

// Each integration test binary compiles this module separately and
// only uses a slice of it.
#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod vim_mock;

pub use fixtures::{
    basic_vm, distributed_nic, host_pg, standard_nic, test_target, test_timeouts, FailingCache,
    MockVimConnector, MockVimSession, RecordingRunner,
};
pub use vim_mock::MockVCenterServer;
