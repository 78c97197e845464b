pub mod builders;
pub mod fake_executor;
pub mod sim;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use voltsched::config::ConfigFile;
use voltsched::types::TaskId;

use crate::builders::{ConfigFileBuilder, TaskConfigBuilder};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

pub const CAMERA: TaskId = 0;
pub const LOCAL: TaskId = 1;
pub const LED: TaskId = 2;

/// Camera (root, re-arms every 10 s) -> Local inference -> LED.
pub fn camera_local_led() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(CAMERA, 3, 4161)
                .name("camera")
                .execution_time(1017)
                .root()
                .timed_rearm(CAMERA, 10_000)
                .unconditional(LOCAL)
                .build(),
        )
        .with_task(
            TaskConfigBuilder::new(LOCAL, 7, 3957)
                .name("local")
                .execution_time(648)
                .unconditional(LED)
                .build(),
        )
        .with_task(
            TaskConfigBuilder::new(LED, 6, 3957)
                .name("led")
                .execution_time(502)
                .build(),
        )
        .build()
}
