use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_longeron")
}

fn unique_temp_dir(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("longeron-{name}-{stamp}"));
    fs::create_dir_all(&dir).expect("temp dir should be created");
    dir
}

#[test]
fn unknown_command_returns_usage() {
    let output = Command::new(bin())
        .arg("frobnicate")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: longeron"));
}

#[test]
fn missing_command_returns_usage() {
    let output = Command::new(bin()).output().expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_passes_with_default_config() {
    // A missing config file falls back to the built-in defaults.
    let output = Command::new(bin())
        .args(["validate", "does-not-exist.json"])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));
}

#[test]
fn validate_rejects_inverted_bounds() {
    let dir = unique_temp_dir("cli-validate");
    let config_path = dir.join("bad.json");
    fs::write(
        &config_path,
        r#"{"bounds":[{"low":5.0,"high":1.0}]}"#,
    )
    .expect("fixture should be written");

    let output = Command::new(bin())
        .args(["validate", config_path.to_string_lossy().as_ref()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validation failed"));
    assert!(stderr.contains("bounds[0]"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn validate_rejects_malformed_config_json() {
    let dir = unique_temp_dir("cli-malformed");
    let config_path = dir.join("broken.json");
    fs::write(&config_path, "{ not json").expect("fixture should be written");

    let output = Command::new(bin())
        .args(["validate", config_path.to_string_lossy().as_ref()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid config"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn memory_reports_a_missing_archive_cleanly() {
    let output = Command::new(bin())
        .args(["memory", "definitely-not-present.json"])
        .output()
        .expect("memory should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no elites recorded yet"));
}

#[test]
fn memory_prints_archive_entries() {
    let dir = unique_temp_dir("cli-memory");
    let archive_path = dir.join("elite_memory.json");
    fs::write(&archive_path, "[[1.5,2.0,10.0],[2.5,1.0,12.0]]").expect("fixture");

    let output = Command::new(bin())
        .args(["memory", archive_path.to_string_lossy().as_ref()])
        .output()
        .expect("memory should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 entr(ies)"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn optimize_rejects_a_non_numeric_seed() {
    let output = Command::new(bin())
        .args(["optimize", "does-not-exist.json", "not-a-seed"])
        .output()
        .expect("optimize should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid seed"));
}

#[test]
fn optimize_runs_end_to_end_and_emits_json() {
    let dir = unique_temp_dir("cli-optimize");
    let config_path = dir.join("run.json");
    // Small budgets over a deliberately sturdy corner of the panel space,
    // where every design clears its margins, so the run ends feasible.
    let config = format!(
        concat!(
            "{{",
            r#""bounds":[{{"low":2.0,"high":4.5}},{{"low":2.0,"high":5.0}},{{"low":8.0,"high":20.0}}],"#,
            r#""samples":60,"num_clusters":2,"gens_per_cluster":3,"pop_cluster":8,"#,
            r#""elite_per_cluster":2,"ensembles":1,"refine_gens":3,"refine_pop":8,"workers":2,"#,
            r#""memory_path":"{mem}","log_path":"{log}","error_log_path":"{err}""#,
            "}}"
        ),
        mem = dir.join("elite_memory.json").to_string_lossy(),
        log = dir.join("search_log.csv").to_string_lossy(),
        err = dir.join("search_errors.log").to_string_lossy(),
    );
    fs::write(&config_path, config).expect("config fixture");

    let output = Command::new(bin())
        .args(["optimize", config_path.to_string_lossy().as_ref(), "42"])
        .output()
        .expect("optimize should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("optimize should emit json");
    assert_eq!(payload["feasible"].as_bool(), Some(true));
    assert_eq!(payload["best_design"].as_array().map(Vec::len), Some(3));
    assert!(payload["best_mass"].as_f64().expect("mass") > 0.0);
    assert!(payload["evaluator_calls"].as_u64().expect("calls") >= 60);

    assert!(dir.join("search_log.csv").exists());
    assert!(dir.join("elite_memory.json").exists());

    let _ = fs::remove_dir_all(dir);
}
