//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the group façade
//! against mock adapters.  No LED hardware or disk state is needed.

mod group_service_tests;
mod mock_hw;
mod replay_tests;
