// ABOUTME: Test support utilities.
// ABOUTME: Scripted runtime and HTTP probe fakes plus a fast-polling configuration.

use shopstack::config::Config;
use shopstack::provision::Provisioner;
use shopstack::types::AdminCredentials;
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fake_probe;
#[allow(dead_code)]
pub mod fake_runtime;

pub use fake_probe::FakeProbe;
pub use fake_runtime::FakeRuntime;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("shopstack=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Defaults with every wait shrunk to milliseconds.
#[allow(dead_code)]
pub fn fast_config(tenants_dir: &Path) -> Config {
    let mut config = Config {
        tenants_dir: tenants_dir.to_path_buf(),
        ..Config::default()
    };
    let tick = Duration::from_millis(5);

    config.launch.timeout = Duration::from_secs(5);
    config.launch.teardown_timeout = Duration::from_secs(1);
    config.database.max_attempts = 5;
    config.database.interval = tick;
    config.application.max_attempts = 5;
    config.application.interval = tick;
    config.application.probe_timeout = Duration::from_millis(200);
    config.finalize.trigger_timeout = Duration::from_millis(200);
    config.finalize.settle_delay = tick;
    config.finalize.retry_delay = tick;
    config.finalize.exec_timeout = Duration::from_millis(200);
    config
}

#[allow(dead_code)]
pub fn credentials() -> AdminCredentials {
    AdminCredentials::new("owner@example.com", "s3cret-pass")
}

/// Provisioner over the fakes; every port passes the bind check.
#[allow(dead_code)]
pub fn provisioner(
    runtime: Arc<FakeRuntime>,
    probe: Arc<FakeProbe>,
    config: Config,
) -> Provisioner<FakeRuntime, FakeProbe> {
    init_tracing();
    Provisioner::new(runtime, probe, config, "203.0.113.7").with_bind_probe(Arc::new(|_: u16| true))
}
