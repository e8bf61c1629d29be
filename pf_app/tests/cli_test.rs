use std::process::Command;

use serde_json::Value;

fn pf_optimize(dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pf_optimize"));
    // No key means synthetic prices, so nothing touches the network
    command.current_dir(dir).env_remove("TIINGO_API_KEY").env("RUST_LOG", "info");
    command
}

#[test]
fn test_stdout_is_only_the_json_report() {
    let dir = tempfile::tempdir().unwrap();

    let output = pf_optimize(dir.path()).args(["-t", "AAPL", "-t", "MSFT"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let report: Value = serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{e}: {stdout}"));
    assert_eq!(report["allocations"].as_array().unwrap().len(), 2);
    assert_eq!(report["fallbackTickers"][0], "AAPL");

    // Logs still reach the console, uncoloured when piped
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Portfolio Optimizer"), "{stderr}");
    assert!(!stderr.contains('\x1b'), "{stderr}");
}

#[test]
fn test_output_file_leaves_stdout_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    let output = pf_optimize(dir.path()).args(["-t", "SPY", "--interval", "weekly", "--output"]).arg(&path).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(output.stdout.is_empty());
    let report: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["interval"], "weekly");
}
