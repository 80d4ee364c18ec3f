#![allow(dead_code)]

pub use actionflow_test_utils::builders;
pub use actionflow_test_utils::fake_runner::FakeRunner;
pub use actionflow_test_utils::{init_tracing, with_timeout};
