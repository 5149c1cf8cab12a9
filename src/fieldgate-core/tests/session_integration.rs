//! End-to-end command dispatch against scripted stand-ins for the external
//! programs and a local TCP feeder for the location source.

use fieldgate_core::config::Config;
use fieldgate_core::error::Error;
use fieldgate_core::location::NoFixReason;
use fieldgate_core::session::{Command, CommandOutcome, SessionOrchestrator, ShipOutcome, StartVpnOutcome};
use fieldgate_core::vpn::{StartOutcome, StopOutcome};
use std::fs;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

const GGA_FIX: &str = "$GPGGA,123519,5230.1234,N,00445.6789,E,1,08,0.9,545.4,M,46.9,M,,*47\n";
const JUNK: &str = "$GPGSV,3,1,11,03,03,111,00*74\nnot a sentence\n";

const REPORT: &str = r#"{"end": {"streams": [{"sender": {"bits_per_second": 184000000.0}}]}}"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Fixture {
    dir: TempDir,
    tool: PathBuf,
    tool_log: PathBuf,
    tunnel: PathBuf,
    ping: PathBuf,
    iperf: PathBuf,
    shipper: PathBuf,
    ship_log: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tool_log = dir.path().join("tool.log");
        let ship_log = dir.path().join("ship.log");

        let tool = script(
            dir.path(),
            "wg-quick",
            &format!("echo \"$1 $2\" >> {}", tool_log.display()),
        );
        let tunnel = dir.path().join("wg0.conf");
        fs::write(&tunnel, "[Interface]\n").unwrap();

        let ping = script(
            dir.path(),
            "ping",
            "echo '64 bytes from 8.8.8.8: icmp_seq=1 ttl=117 time=23.4 ms'",
        );
        let iperf = script(dir.path(), "iperf3", &format!("echo '{REPORT}'"));
        let shipper = script(
            dir.path(),
            "shipper",
            &format!("echo run >> {}; echo 'shipped 42 records'", ship_log.display()),
        );

        Self {
            dir,
            tool,
            tool_log,
            tunnel,
            ping,
            iperf,
            shipper,
            ship_log,
        }
    }

    fn orchestrator(&self, gps: SocketAddr, bounds: [f64; 4], floor: f64) -> SessionOrchestrator {
        let raw = serde_json::json!({
            "vpn": {"tool": self.tool, "config": self.tunnel},
            "gps": {"host": "127.0.0.1", "port": gps.port(), "read_timeout_secs": 5},
            "geofence": {
                "min_lat": bounds[0], "max_lat": bounds[1],
                "min_lon": bounds[2], "max_lon": bounds[3]
            },
            "probe": {"program": self.ping, "target": "8.8.8.8", "timeout_secs": 2},
            "speedtest": {
                "program": self.iperf, "host": "127.0.0.1",
                "rounds": 2, "interval_secs": 0, "round_timeout_secs": 5,
                "min_average_mbps": floor
            },
            "shipper": {"program": self.shipper}
        });
        let config: Config = serde_json::from_value(raw).unwrap();
        config.validate().unwrap();
        SessionOrchestrator::new(config)
    }

    fn tool_invocations(&self) -> String {
        fs::read_to_string(&self.tool_log).unwrap_or_default()
    }

    fn ship_count(&self) -> usize {
        fs::read_to_string(&self.ship_log)
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}

/// Serves the given sentences to the first client, then closes.
async fn spawn_feeder(lines: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(lines.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    addr
}

#[tokio::test]
async fn in_bounds_fix_starts_the_tunnel_and_probes() {
    let fixture = Fixture::new();
    let gps = spawn_feeder(GGA_FIX).await;
    let orchestrator = fixture.orchestrator(gps, [52.0, 53.0, 4.0, 5.0], 20.0);

    let outcome = orchestrator.dispatch(Command::StartVpn).await.unwrap();
    match outcome {
        CommandOutcome::VpnStart(StartVpnOutcome::Tunnel { position, outcome }) => {
            assert!((position.latitude - (52.0 + 30.1234 / 60.0)).abs() < 1e-9);
            assert_eq!(outcome, StartOutcome::Up { latency_ms: 23 });
        }
        other => panic!("expected tunnel start, got {other:?}"),
    }

    let invocations = fixture.tool_invocations();
    assert!(invocations.contains("up"));
    assert!(invocations.contains(&fixture.tunnel.display().to_string()));
}

#[tokio::test]
async fn out_of_bounds_fix_never_invokes_the_tool() {
    let fixture = Fixture::new();
    let gps = spawn_feeder(GGA_FIX).await;
    let orchestrator = fixture.orchestrator(gps, [0.0, 1.0, 4.0, 5.0], 20.0);

    let outcome = orchestrator.dispatch(Command::StartVpn).await.unwrap();
    assert!(matches!(
        outcome,
        CommandOutcome::VpnStart(StartVpnOutcome::OutsideGeofence { .. })
    ));
    assert!(!fixture.tool_log.exists());
}

#[tokio::test]
async fn no_fix_is_never_read_as_admission() {
    let fixture = Fixture::new();
    let gps = spawn_feeder(JUNK).await;
    let orchestrator = fixture.orchestrator(gps, [52.0, 53.0, 4.0, 5.0], 20.0);

    let outcome = orchestrator.dispatch(Command::StartVpn).await.unwrap();
    assert!(matches!(
        outcome,
        CommandOutcome::VpnStart(StartVpnOutcome::NoFix(NoFixReason::StreamEnded))
    ));
    assert!(!fixture.tool_log.exists());
}

#[tokio::test]
async fn missing_tunnel_config_fails_before_the_tool_runs() {
    let fixture = Fixture::new();
    fs::remove_file(&fixture.tunnel).unwrap();
    let gps = spawn_feeder(GGA_FIX).await;
    let orchestrator = fixture.orchestrator(gps, [52.0, 53.0, 4.0, 5.0], 20.0);

    match orchestrator.dispatch(Command::StartVpn).await {
        Err(Error::ConfigFileNotFound(path)) => assert_eq!(path, fixture.tunnel),
        other => panic!("expected ConfigFileNotFound, got {other:?}"),
    }
    assert!(!fixture.tool_log.exists());
}

#[tokio::test]
async fn failed_tool_surfaces_stderr_verbatim() {
    let fixture = Fixture::new();
    script(
        fixture.dir.path(),
        "wg-quick",
        "echo 'wg-quick: address already in use' >&2; exit 1",
    );
    let gps = spawn_feeder(GGA_FIX).await;
    let orchestrator = fixture.orchestrator(gps, [52.0, 53.0, 4.0, 5.0], 20.0);

    match orchestrator.dispatch(Command::StartVpn).await.unwrap() {
        CommandOutcome::VpnStart(StartVpnOutcome::Tunnel {
            outcome: StartOutcome::Failed { stderr },
            ..
        }) => assert!(stderr.contains("address already in use")),
        other => panic!("expected failed start, got {other:?}"),
    }
}

#[tokio::test]
async fn unanswered_probe_is_distinct_from_a_hard_failure() {
    let fixture = Fixture::new();
    script(fixture.dir.path(), "ping", "exit 1");
    let gps = spawn_feeder(GGA_FIX).await;
    let orchestrator = fixture.orchestrator(gps, [52.0, 53.0, 4.0, 5.0], 20.0);

    match orchestrator.dispatch(Command::StartVpn).await.unwrap() {
        CommandOutcome::VpnStart(StartVpnOutcome::Tunnel {
            outcome: StartOutcome::Unreachable { .. },
            ..
        }) => {}
        other => panic!("expected unreachable, got {other:?}"),
    }
    // the tunnel did come up
    assert!(fixture.tool_invocations().contains("up"));
}

#[tokio::test]
async fn stop_runs_without_any_geofence_check() {
    let fixture = Fixture::new();
    // no feeder: stop must not consult the location source at all
    let orchestrator = fixture.orchestrator(
        "127.0.0.1:1".parse().unwrap(),
        [52.0, 53.0, 4.0, 5.0],
        20.0,
    );

    let outcome = orchestrator.dispatch(Command::StopVpn).await.unwrap();
    assert_eq!(outcome, CommandOutcome::VpnStop(StopOutcome::Down));
    assert!(fixture.tool_invocations().contains("down"));
}

#[tokio::test]
async fn stable_run_triggers_the_shipper_exactly_once() {
    let fixture = Fixture::new();
    let orchestrator = fixture.orchestrator(
        "127.0.0.1:1".parse().unwrap(),
        [52.0, 53.0, 4.0, 5.0],
        20.0,
    );

    match orchestrator.dispatch(Command::TestSpeed).await.unwrap() {
        CommandOutcome::SpeedTest(report) => {
            assert!(report.verdict.stable);
            assert_eq!(report.verdict.average, 23.0);
            assert_eq!(report.samples.len(), 2);
            match report.shipped {
                Some(ShipOutcome::Sent { stdout }) => {
                    assert!(stdout.contains("shipped 42 records"));
                }
                other => panic!("expected shipped outcome, got {other:?}"),
            }
        }
        other => panic!("expected speed report, got {other:?}"),
    }
    assert_eq!(fixture.ship_count(), 1);
}

#[tokio::test]
async fn unstable_run_does_not_ship() {
    let fixture = Fixture::new();
    // floor far above what the fake test program reports
    let orchestrator = fixture.orchestrator(
        "127.0.0.1:1".parse().unwrap(),
        [52.0, 53.0, 4.0, 5.0],
        100.0,
    );

    match orchestrator.dispatch(Command::TestSpeed).await.unwrap() {
        CommandOutcome::SpeedTest(report) => {
            assert!(!report.verdict.stable);
            assert!(report.shipped.is_none());
        }
        other => panic!("expected speed report, got {other:?}"),
    }
    assert_eq!(fixture.ship_count(), 0);
}

#[tokio::test]
async fn send_data_runs_the_shipper_directly() {
    let fixture = Fixture::new();
    let orchestrator = fixture.orchestrator(
        "127.0.0.1:1".parse().unwrap(),
        [52.0, 53.0, 4.0, 5.0],
        20.0,
    );

    match orchestrator.dispatch(Command::SendData).await.unwrap() {
        CommandOutcome::DataSend(ShipOutcome::Sent { stdout }) => {
            assert!(stdout.contains("shipped 42 records"));
        }
        other => panic!("expected sent outcome, got {other:?}"),
    }
    assert_eq!(fixture.ship_count(), 1);
}

#[tokio::test]
async fn failing_shipper_is_reported_not_fatal() {
    let fixture = Fixture::new();
    script(
        fixture.dir.path(),
        "shipper",
        "echo 'broker unreachable' >&2; exit 3",
    );
    let orchestrator = fixture.orchestrator(
        "127.0.0.1:1".parse().unwrap(),
        [52.0, 53.0, 4.0, 5.0],
        20.0,
    );

    match orchestrator.dispatch(Command::SendData).await.unwrap() {
        CommandOutcome::DataSend(ShipOutcome::Failed { code, stderr }) => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("broker unreachable"));
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }
}
