//! End-to-end tests for the slirp4netns parent and child drivers.
//!
//! The real helper and `nsenter` are replaced by a shell script that
//! records its arguments and pid, and by an in-memory device preparer, so
//! these tests exercise supervision and cleanup without privileges.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rootnet_common::config::DriverConfig;
use rootnet_common::error::{Result, RootnetError};
use rootnet_core::cleanup::CleanupChain;
use rootnet_core::device::DevicePreparer;
use rootnet_core::driver::{ChildDriver, ParentDriver, Slirp4netnsChild, Slirp4netnsParent};

type Log = Arc<Mutex<Vec<String>>>;

/// Records preparation and release of devices.
struct FakePreparer {
    log: Log,
    fail: bool,
}

impl DevicePreparer for FakePreparer {
    fn prepare(&self, pid: u32, device: &str, cleanup: &mut CleanupChain) -> Result<()> {
        self.log.lock().unwrap().push(format!("prepare {device} in {pid}"));
        let log = Arc::clone(&self.log);
        let name = device.to_string();
        cleanup.push(format!("release {device}"), move || {
            log.lock().unwrap().push(format!("release {name}"));
            Ok(())
        });
        if self.fail {
            return Err(RootnetError::DevicePreparationFailed {
                device: device.to_string(),
                reason: "ip tuntap add: permission denied".into(),
            });
        }
        Ok(())
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    helper: PathBuf,
    log: Log,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args");
        let pid_file = dir.path().join("pid");
        let helper = dir.path().join("slirp4netns");
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o755)
            .open(&helper)
            .unwrap();
        write!(
            file,
            "#!/bin/sh\necho $$ > {pid}.tmp && mv {pid}.tmp {pid}\n\
             echo \"$@\" > {args}.tmp && mv {args}.tmp {args}\n\
             exec sleep 30\n",
            pid = pid_file.display(),
            args = args_file.display(),
        )
        .unwrap();
        file.sync_all().unwrap();
        drop(file);

        Self {
            dir,
            helper,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn config(&self) -> DriverConfig {
        DriverConfig::new(self.helper.to_str().unwrap())
    }

    fn driver(&self, config: DriverConfig, fail_prepare: bool) -> Slirp4netnsParent {
        Slirp4netnsParent::new(config).unwrap().with_device_preparer(FakePreparer {
            log: Arc::clone(&self.log),
            fail: fail_prepare,
        })
    }

    fn wait_for(&self, name: &str) -> String {
        let path = self.dir.path().join(name);
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Ok(content) = std::fs::read_to_string(&path) {
                return content.trim().to_string();
            }
            assert!(Instant::now() < deadline, "helper never wrote {name}");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn process_exists(pid: &str) -> bool {
    Path::new("/proc").join(pid).exists()
}

#[test]
fn configure_launches_helper_and_cleanup_stops_it() {
    let fx = Fixture::new();
    let driver = fx.driver(fx.config(), false);

    let configured = driver
        .configure_network(4242, fx.dir.path())
        .expect("configure network");

    let msg = &configured.message;
    assert_eq!(msg.dev, "tap0");
    assert_eq!(msg.mtu, 65520);
    assert_eq!(msg.ip.to_string(), "10.0.2.100");
    assert_eq!(msg.netmask, 24);
    assert_eq!(msg.gateway.to_string(), "10.0.2.2");
    assert_eq!(msg.dns.to_string(), "10.0.2.3");

    assert_eq!(fx.wait_for("args"), "--mtu 65520 4242 tap0");
    let helper_pid = fx.wait_for("pid");
    assert!(process_exists(&helper_pid));

    assert_eq!(
        configured.cleanup.names().collect::<Vec<_>>(),
        ["release tap0", "stop slirp4netns"]
    );
    configured.cleanup.run().unwrap();

    assert!(!process_exists(&helper_pid));
    assert_eq!(fx.entries(), ["prepare tap0 in 4242", "release tap0"]);
}

#[test]
fn dropping_unrun_cleanup_still_stops_helper() {
    let fx = Fixture::new();
    let driver = fx.driver(fx.config(), false);

    let configured = driver.configure_network(4343, fx.dir.path()).unwrap();
    let helper_pid = fx.wait_for("pid");
    assert!(process_exists(&helper_pid));

    drop(configured);
    assert!(!process_exists(&helper_pid));
    assert_eq!(fx.entries(), ["prepare tap0 in 4343"]);
}

#[test]
fn helper_receives_configured_switches_in_order() {
    let fx = Fixture::new();
    let config = fx
        .config()
        .with_mtu(1500)
        .with_cidr("10.0.3.0/24".parse().unwrap())
        .with_disable_host_loopback(true)
        .with_api_socket("/tmp/rootnet-api.sock")
        .with_create_sandbox(true);
    let driver = fx.driver(config, false);

    let configured = driver.configure_network(77, fx.dir.path()).unwrap();
    assert_eq!(
        fx.wait_for("args"),
        "--mtu 1500 --disable-host-loopback --cidr 10.0.3.0/24 \
         --api-socket /tmp/rootnet-api.sock --create-sandbox 77 tap0"
    );

    let msg = &configured.message;
    assert_eq!(msg.mtu, 1500);
    assert_eq!(msg.ip.to_string(), "10.0.3.100");
    assert_eq!(msg.gateway.to_string(), "10.0.3.2");
    assert_eq!(msg.dns.to_string(), "10.0.3.3");

    configured.cleanup.run().unwrap();
}

#[test]
fn device_failure_returns_owed_cleanup() {
    let fx = Fixture::new();
    let driver = fx.driver(fx.config(), true);

    let failure = driver.configure_network(1, fx.dir.path()).unwrap_err();
    assert!(matches!(
        failure.error,
        RootnetError::DevicePreparationFailed { .. }
    ));
    assert_eq!(failure.cleanup.names().collect::<Vec<_>>(), ["release tap0"]);

    let _ = failure.cleanup_and_into_error();
    assert_eq!(fx.entries(), ["prepare tap0 in 1", "release tap0"]);
    assert!(!fx.dir.path().join("args").exists());
}

#[test]
fn start_failure_still_releases_device() {
    let fx = Fixture::new();
    let driver = fx.driver(DriverConfig::new("/nonexistent/slirp4netns"), false);

    let failure = driver.configure_network(5, fx.dir.path()).unwrap_err();
    match &failure.error {
        RootnetError::ProcessStartFailed { command, .. } => {
            assert_eq!(command, "/nonexistent/slirp4netns --mtu 65520 5 tap0");
        }
        other => panic!("unexpected error: {other}"),
    }

    failure.cleanup.run().unwrap();
    assert_eq!(fx.entries(), ["prepare tap0 in 5", "release tap0"]);
}

#[test]
fn address_overflow_keeps_helper_cleanup() {
    let fx = Fixture::new();
    let config = fx.config().with_cidr("255.255.255.252/30".parse().unwrap());
    let driver = fx.driver(config, false);

    let failure = driver.configure_network(9, fx.dir.path()).unwrap_err();
    assert!(matches!(
        failure.error,
        RootnetError::AddressComputation { .. }
    ));
    assert_eq!(
        failure.cleanup.names().collect::<Vec<_>>(),
        ["release tap0", "stop slirp4netns"]
    );

    let helper_pid = fx.wait_for("pid");
    failure.cleanup.run().unwrap();
    assert!(!process_exists(&helper_pid));
}

#[test]
fn concurrent_configurations_are_independent() {
    let fx = Fixture::new();
    let driver = Arc::new(fx.driver(fx.config(), false));

    let handles: Vec<_> = [101_u32, 102]
        .into_iter()
        .map(|pid| {
            let driver = Arc::clone(&driver);
            let state_dir = fx.dir.path().to_path_buf();
            std::thread::spawn(move || {
                let configured = driver.configure_network(pid, &state_dir).unwrap();
                assert_eq!(configured.message.dev, "tap0");
                configured.cleanup.run().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut entries = fx.entries();
    entries.sort();
    assert_eq!(
        entries,
        [
            "prepare tap0 in 101",
            "prepare tap0 in 102",
            "release tap0",
            "release tap0"
        ]
    );
}

#[test]
fn message_survives_the_namespace_boundary() {
    let fx = Fixture::new();
    let driver = fx.driver(fx.config(), false);
    let configured = driver.configure_network(3, fx.dir.path()).unwrap();

    let wire = serde_json::to_string(&configured.message).unwrap();
    let received = serde_json::from_str(&wire).unwrap();
    assert_eq!(
        Slirp4netnsChild.configure_network_child(&received).unwrap(),
        "tap0"
    );

    configured.cleanup.run().unwrap();
}
