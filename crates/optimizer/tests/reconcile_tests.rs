//! Full reconciliation cycles against a temporary configuration directory

use optimizer::{CodecPolicy, ReconciliationLoop, Settings};
use pjsip_config::{ensure_config_files, CodecList, PjsipConfigStore, PjsipPaths};
use pretty_assertions::assert_eq;
use probe_core::mock::ScriptedRunner;
use probe_core::CommandOutput;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const CONTACTS: &str = "
  Contact:  <Aor/ContactUri..............................> <Hash....> <Status> <RTT(ms)..>
==========================================================================================

  Contact:  200/sip:200@10.0.0.5:5060;ob                   5c2b0c4a91 Avail        12.100
  Contact:  201/sip:201@10.0.0.6:5060;ob                   9f8e7d6c5b Avail         8.250

Objects found: 2
";

fn report(value: &str, unit: &str) -> String {
    format!(
        "[  5]   0.00-3.00   sec  37.5 KBytes   {value} {unit}    0             sender\n\
         [  5]   0.00-3.04   sec  37.5 KBytes   {value} {unit}                  receiver\n"
    )
}

/// A configuration directory with users 200 and 201 on the store default codecs
fn create_test_conf() -> (Settings, PjsipPaths, TempDir) {
    let dir = TempDir::new().unwrap();
    let paths = PjsipPaths::in_dir(dir.path());
    ensure_config_files(&paths).unwrap();

    let mut store = PjsipConfigStore::open(&paths).unwrap();
    store.add_user("200", "secret200", None).unwrap();
    store.add_user("201", "secret201", None).unwrap();
    store.persist().unwrap();

    let mut settings = Settings::default();
    settings.asterisk.conf_dir = dir.path().to_path_buf();
    (settings, paths, dir)
}

fn allow_of(paths: &PjsipPaths, extension: &str) -> String {
    let store = PjsipConfigStore::open(paths).unwrap();
    store
        .profile(extension)
        .unwrap()
        .endpoint
        .get("allow")
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_fast_link_gets_g711_first() {
    let (settings, paths, _dir) = create_test_conf();
    let runner = Arc::new(
        ScriptedRunner::new()
            .on_arg("asterisk", "pjsip show contacts", CommandOutput::ok(CONTACTS))
            .on_arg("asterisk", "core reload", CommandOutput::ok(""))
            .on_arg("iperf3", "10.0.0.5", CommandOutput::ok(report("100", "Kbits/sec")))
            .on_arg("iperf3", "10.0.0.6", CommandOutput::ok(report("5.00", "Kbits/sec"))),
    );

    let mut reconciler = ReconciliationLoop::new(runner.clone(), &settings).unwrap();
    let report = reconciler.run_cycle().await.unwrap();

    assert_eq!(report.cycle, 1);
    assert_eq!(report.discovered(), 2);
    assert_eq!(report.updated(), 2);
    assert!(report.reloaded);
    assert_eq!(report.outcomes[0].policy, Some(CodecPolicy::HighBandwidth));
    assert_eq!(report.outcomes[1].policy, Some(CodecPolicy::LowBandwidth));
    assert_eq!(report.next_sleep, Duration::from_secs(600));

    assert_eq!(allow_of(&paths, "200"), "ulaw,alaw,opus,g729,gsm");
    assert_eq!(allow_of(&paths, "201"), "opus,gsm,ulaw,alaw,g729");

    // probes run one after another, each for three seconds, before the reload
    let programs: Vec<String> = runner
        .calls()
        .iter()
        .map(|call| call.join(" "))
        .collect();
    assert_eq!(
        programs,
        vec![
            "asterisk -rx pjsip show contacts",
            "iperf3 -c 10.0.0.5 -p 5201 -t 3",
            "iperf3 -c 10.0.0.6 -p 5201 -t 3",
            "asterisk -rx core reload",
        ]
    );
}

#[tokio::test]
async fn test_failed_probe_keeps_previous_codecs() {
    let (settings, paths, _dir) = create_test_conf();
    let runner = Arc::new(
        ScriptedRunner::new()
            .on_arg("asterisk", "pjsip show contacts", CommandOutput::ok(CONTACTS))
            .on_arg("asterisk", "core reload", CommandOutput::ok(""))
            .on_arg("iperf3", "10.0.0.5", CommandOutput::ok(report("40", "Kbits/sec")))
            .on_arg(
                "iperf3",
                "10.0.0.6",
                CommandOutput::failed(1, "iperf3: error - unable to connect to server"),
            ),
    );

    let mut reconciler = ReconciliationLoop::new(runner, &settings).unwrap();
    let report = reconciler.run_cycle().await.unwrap();

    assert_eq!(report.updated(), 1);
    assert_eq!(report.outcomes[1].policy, None);
    assert!(!report.outcomes[1].sample.is_measured());

    assert_eq!(allow_of(&paths, "200"), "g729,opus,ulaw,alaw,gsm");
    assert_eq!(allow_of(&paths, "201"), "opus,alaw,ulaw,g729,gsm");
}

#[tokio::test]
async fn test_reload_failure_does_not_abort_cycle() {
    let (settings, paths, _dir) = create_test_conf();
    let runner = Arc::new(
        ScriptedRunner::new()
            .on_arg("asterisk", "pjsip show contacts", CommandOutput::ok(CONTACTS))
            .on_arg(
                "asterisk",
                "core reload",
                CommandOutput::failed(1, "Unable to connect to remote asterisk"),
            )
            .on("iperf3", CommandOutput::ok(report("1.00", "Mbits/sec"))),
    );

    let mut reconciler = ReconciliationLoop::new(runner, &settings).unwrap();
    let first = reconciler.run_cycle().await.unwrap();
    assert!(!first.reloaded);
    assert_eq!(first.updated(), 2);
    assert_eq!(allow_of(&paths, "201"), "ulaw,alaw,opus,g729,gsm");

    let second = reconciler.run_cycle().await.unwrap();
    assert_eq!(second.cycle, 2);
    assert_eq!(second.updated(), 0, "codec lists already match");
}

#[tokio::test]
async fn test_no_endpoints_sleeps_for_the_floor() {
    let (settings, paths, _dir) = create_test_conf();
    let before = fs::read_to_string(&paths.endpoint).unwrap();
    let runner = Arc::new(
        ScriptedRunner::new()
            .missing("asterisk")
            .on("iperf3", CommandOutput::ok(report("1.00", "Mbits/sec"))),
    );

    let mut reconciler = ReconciliationLoop::new(runner.clone(), &settings).unwrap();
    let report = reconciler.run_cycle().await.unwrap();

    assert_eq!(report.discovered(), 0);
    assert!(!report.reloaded);
    assert_eq!(report.next_sleep, Duration::from_secs(60));
    assert!(runner.calls_to("iperf3").is_empty());
    assert_eq!(fs::read_to_string(&paths.endpoint).unwrap(), before);
}

#[tokio::test]
async fn test_unmanaged_endpoint_is_skipped() {
    let (settings, paths, _dir) = create_test_conf();
    let contacts = "  Contact:  300/sip:300@10.0.0.30:5060;ob  1a2b3c4d5e Avail  3.000\n";
    let runner = Arc::new(
        ScriptedRunner::new()
            .on_arg("asterisk", "pjsip show contacts", CommandOutput::ok(contacts))
            .on_arg("asterisk", "core reload", CommandOutput::ok(""))
            .on("iperf3", CommandOutput::ok(report("1.00", "Mbits/sec"))),
    );

    let mut reconciler = ReconciliationLoop::new(runner, &settings).unwrap();
    let report = reconciler.run_cycle().await.unwrap();

    assert_eq!(report.discovered(), 1);
    assert_eq!(report.updated(), 0);
    assert!(report.reloaded);
    let store = PjsipConfigStore::open(&paths).unwrap();
    assert!(!store.contains("300"));
}

#[tokio::test]
async fn test_edits_made_between_cycles_are_kept() {
    let (settings, paths, _dir) = create_test_conf();
    let contacts = "  Contact:  200/sip:200@10.0.0.5:5060;ob  5c2b0c4a91 Avail  12.100\n";
    let runner = Arc::new(
        ScriptedRunner::new()
            .on_arg("asterisk", "pjsip show contacts", CommandOutput::ok(contacts))
            .on_arg("asterisk", "core reload", CommandOutput::ok(""))
            .on("iperf3", CommandOutput::ok(report("1.00", "Mbits/sec"))),
    );
    let mut reconciler = ReconciliationLoop::new(runner, &settings).unwrap();
    reconciler.run_cycle().await.unwrap();

    // another tool adds a user while the loop sleeps
    let mut store = PjsipConfigStore::open(&paths).unwrap();
    let codecs = CodecList::parse("gsm").unwrap();
    store.add_user("202", "secret202", Some(&codecs)).unwrap();
    store.persist().unwrap();

    reconciler.run_cycle().await.unwrap();

    assert_eq!(allow_of(&paths, "202"), "gsm");
    assert_eq!(allow_of(&paths, "200"), "ulaw,alaw,opus,g729,gsm");
    let dialplan = fs::read_to_string(&paths.extensions).unwrap();
    assert!(dialplan.contains("exten => 202,1,Dial(PJSIP/202)"));
}
