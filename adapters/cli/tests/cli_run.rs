use std::process::Command;

const DEMO_LEVEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../levels/demo.toml");

fn creep_defence() -> Command {
    Command::new(env!("CARGO_BIN_EXE_creep-defence"))
}

#[test]
fn demo_level_runs_to_a_json_summary() {
    let output = creep_defence()
        .args([DEMO_LEVEL, "--json", "--log-level", "off", "--seed", "3"])
        .output()
        .expect("failed to launch creep-defence");
    assert!(output.status.success(), "{output:?}");

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary is valid JSON");
    assert_eq!(summary["level"], "Crossroads");
    assert_eq!(summary["waves"], 3);
    assert_eq!(summary["total_creeps"], 18);

    let status = summary["status"].as_str().expect("status is a string");
    assert!(["playing", "won", "lost"].contains(&status), "{status}");
    if status == "won" {
        assert_eq!(summary["processed_creeps"], summary["total_creeps"]);
    }
}

#[test]
fn missing_levels_fail_with_their_path() {
    let output = creep_defence()
        .args(["no/such/level.toml", "--log-level", "off"])
        .output()
        .expect("failed to launch creep-defence");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no/such/level.toml"), "{stderr}");
}
