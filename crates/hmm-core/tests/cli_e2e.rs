//! End-to-end tests for the `hmm` binary against models on disk.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use hmm_core::inference::Hmm;
use hmm_core::store;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TRAINING_SEQUENCE: [usize; 12] = [0, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0];

/// Binary with logging and config lookups isolated from the environment.
fn hmm(config_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("hmm");
    cmd.env_remove("HMM_LOG")
        .env_remove("RUST_LOG")
        .env_remove("HMM_LOG_FORMAT")
        .env("HMM_CONFIG_DIR", config_dir);
    cmd
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        let ws = Workspace { dir };
        let weather = Hmm::new(
            vec![0.5, 0.5],
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.9, 0.1], vec![0.2, 0.8]],
        )
        .unwrap();
        store::save_model(&ws.path("model"), &weather).unwrap();
        store::save_sequence(&ws.path("short.txt"), &[0, 0, 1]).unwrap();
        store::save_sequence(&ws.path("long.txt"), &TRAINING_SEQUENCE).unwrap();
        ws
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        hmm(&self.path("config"))
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

mod commands {
    use super::*;

    #[test]
    fn evaluate_reports_likelihood() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("short.txt");
        let out = ws.json(&["evaluate", "-m", path_str(&model), "-s", path_str(&seq)]);

        assert_eq!(out["command"], "evaluate");
        assert_eq!(out["schema_version"], "1.0.0");
        assert!(out["generated_at"].is_string());
        assert!(out["run_id"].as_str().unwrap().starts_with("run-"));
        assert_eq!(out["sequence_length"], 3);
        let p = out["likelihood"].as_f64().unwrap();
        assert!((p - 0.119325).abs() < 1e-9);
        let log_p = out["log_likelihood"].as_f64().unwrap();
        assert!((log_p - 0.119325f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn decode_returns_and_writes_path() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("short.txt");
        let states = ws.path("states.txt");
        let out = ws.json(&[
            "decode",
            "-m",
            path_str(&model),
            "-s",
            path_str(&seq),
            "-o",
            path_str(&states),
        ]);

        assert_eq!(out["states"], serde_json::json!([0, 0, 1]));
        assert_eq!(store::load_sequence(&states).unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn posteriors_rows_sum_to_one() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("long.txt");
        let matrix = ws.path("posteriors.txt");
        let out = ws.json(&[
            "posteriors",
            "-m",
            path_str(&model),
            "-s",
            path_str(&seq),
            "-o",
            path_str(&matrix),
        ]);

        let rows = out["posteriors"].as_array().unwrap();
        assert_eq!(rows.len(), TRAINING_SEQUENCE.len());
        for row in rows {
            let sum: f64 = row.as_array().unwrap().iter().map(|v| v.as_f64().unwrap()).sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
        let text = fs::read_to_string(&matrix).unwrap();
        assert!(text.starts_with("12 2"));
    }

    #[test]
    fn improve_writes_a_loadable_model() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("long.txt");
        let next = ws.path("improved");
        let out = ws.json(&[
            "improve",
            "-m",
            path_str(&model),
            "-s",
            path_str(&seq),
            "-o",
            path_str(&next),
        ]);

        let before = out["log_likelihood_before"].as_f64().unwrap();
        let after = out["log_likelihood_after"].as_f64().unwrap();
        assert!(after >= before - 1e-9);
        let improved = store::load_model(&next).unwrap();
        assert_eq!(improved.num_states(), 2);
    }

    #[test]
    fn train_converges_with_defaults() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("long.txt");
        let trained = ws.path("trained");
        let out = ws.json(&[
            "train",
            "-m",
            path_str(&model),
            "-s",
            path_str(&seq),
            "-o",
            path_str(&trained),
        ]);

        assert_eq!(out["converged"], true);
        assert_eq!(out["stop_reason"], "converged");
        assert_eq!(out["settings"]["max_iterations"], 100);
        assert!(out["config"]["training_path"].is_null());
        let history = out["history"].as_array().unwrap();
        assert_eq!(history.len() as u64, out["iterations"].as_u64().unwrap());
        assert!(store::load_model(&trained).is_ok());
    }

    #[test]
    fn sample_is_reproducible_with_seed() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let emitted = ws.path("emitted.txt");
        let args = [
            "sample",
            "-m",
            path_str(&model),
            "-n",
            "25",
            "--seed",
            "11",
            "-o",
            path_str(&emitted),
        ];
        let first = ws.json(&args);
        let second = ws.json(&args);

        assert_eq!(first["emissions"], second["emissions"]);
        assert_eq!(first["states"], second["states"]);
        assert_eq!(store::load_sequence(&emitted).unwrap().len(), 25);
    }

    #[test]
    fn init_writes_uniform_and_random_models() {
        let ws = Workspace::new();
        let uniform = ws.path("uniform");
        let random = ws.path("random");

        let out = ws.json(&[
            "init",
            "--states",
            "3",
            "--emissions",
            "4",
            "-o",
            path_str(&uniform),
        ]);
        assert_eq!(out["kind"], "uniform");
        let hmm = store::load_model(&uniform).unwrap();
        assert_eq!(hmm.emission_probabilities()[0], vec![0.25; 4]);

        ws.json(&[
            "init",
            "--states",
            "2",
            "--emissions",
            "5",
            "--seed",
            "3",
            "-o",
            path_str(&random),
        ]);
        let hmm = store::load_model(&random).unwrap();
        assert_eq!(hmm.num_emissions(), 5);
    }

    #[test]
    fn check_passes_for_valid_inputs() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("long.txt");
        let out = ws.json(&["check", "-m", path_str(&model), "-s", path_str(&seq)]);
        assert_eq!(out["status"], "ok");
        assert_eq!(out["checks"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn version_reports_schema() {
        let ws = Workspace::new();
        let out = ws.json(&["version"]);
        assert_eq!(out["schema_version"], "1.0.0");
        assert!(out["hmm_version"].is_string());
    }
}

mod exit_codes {
    use super::*;

    #[test]
    fn train_budget_exhausted_exits_one() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("long.txt");
        let trained = ws.path("trained");
        ws.cmd()
            .args([
                "train",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
                "-o",
                path_str(&trained),
                "--max-iterations",
                "2",
                "--tolerance",
                "1e-300",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"converged\": false"));
        assert!(store::load_model(&trained).is_ok());
    }

    #[test]
    fn train_keeps_last_model_when_final_symbol_vanishes() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("tail.txt");
        store::save_sequence(&seq, &[0, 0, 0, 1]).unwrap();
        let trained = ws.path("trained");
        ws.cmd()
            .args([
                "train",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
                "-o",
                path_str(&trained),
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"stop_reason\": \"sequence_impossible\""))
            .stdout(predicate::str::contains("\"iterations\": 0"));
        assert_eq!(
            store::load_model(&trained).unwrap(),
            store::load_model(&model).unwrap()
        );
    }

    #[test]
    fn symbol_out_of_range_exits_eleven() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("bad.txt");
        fs::write(&seq, "3 0 2 1").unwrap();
        ws.cmd()
            .args(["evaluate", "-m", path_str(&model), "-s", path_str(&seq)])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("outside"));
    }

    #[test]
    fn shape_mismatch_exits_eleven() {
        let ws = Workspace::new();
        let model = ws.path("model");
        fs::write(model.join("transition.txt"), "2 2 0.7 0.3 0.4").unwrap();
        let seq = ws.path("short.txt");
        ws.cmd()
            .args(["decode", "-m", path_str(&model), "-s", path_str(&seq)])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("\"code\": 22"));
    }

    #[test]
    fn degenerate_reestimation_exits_thirteen() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("single.txt");
        store::save_sequence(&seq, &[0]).unwrap();
        ws.cmd()
            .args([
                "improve",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
                "-o",
                path_str(&ws.path("out")),
            ])
            .assert()
            .code(13);
    }

    #[test]
    fn missing_model_exits_twenty_one() {
        let ws = Workspace::new();
        let seq = ws.path("short.txt");
        ws.cmd()
            .args([
                "evaluate",
                "-m",
                path_str(&ws.path("nope")),
                "-s",
                path_str(&seq),
            ])
            .assert()
            .code(21);
    }

    #[test]
    fn invalid_settings_exit_twelve() {
        let ws = Workspace::new();
        let settings = ws.path("training.json");
        fs::write(&settings, r#"{"max_iterations": 0}"#).unwrap();
        let model = ws.path("model");
        let seq = ws.path("long.txt");
        ws.cmd()
            .args([
                "--config",
                path_str(&settings),
                "train",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
                "-o",
                path_str(&ws.path("out")),
            ])
            .assert()
            .code(12);
    }

    #[test]
    fn settings_file_from_config_dir_is_used() {
        let ws = Workspace::new();
        fs::write(
            ws.path("config").join("training.json"),
            r#"{"max_iterations": 1, "tolerance": 1e-300}"#,
        )
        .unwrap();
        let model = ws.path("model");
        let seq = ws.path("long.txt");
        ws.cmd()
            .args([
                "train",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
                "-o",
                path_str(&ws.path("out")),
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"iterations\": 1"));
    }

    #[test]
    fn check_reports_invalid_model() {
        let ws = Workspace::new();
        let model = ws.path("model");
        fs::write(model.join("initial.txt"), "2 0.5 0.6").unwrap();
        ws.cmd()
            .args(["check", "-m", path_str(&model)])
            .assert()
            .code(11)
            .stdout(predicate::str::contains("\"status\": \"error\""));
    }
}

mod formats {
    use super::*;

    #[test]
    fn summary_format_is_one_line() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("short.txt");
        ws.cmd()
            .args([
                "--format",
                "summary",
                "decode",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("[run-"))
            .stdout(predicate::str::contains("decode: 0 0 1"));
    }

    #[test]
    fn markdown_format_has_heading() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("short.txt");
        ws.cmd()
            .args([
                "-f",
                "md",
                "evaluate",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("# hmm evaluate"))
            .stdout(predicate::str::contains("**log_likelihood**"));
    }

    #[test]
    fn exitcode_format_is_silent() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("short.txt");
        ws.cmd()
            .args([
                "-f",
                "exitcode",
                "evaluate",
                "-m",
                path_str(&model),
                "-s",
                path_str(&seq),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn jsonl_logs_go_to_stderr() {
        let ws = Workspace::new();
        let model = ws.path("model");
        let seq = ws.path("short.txt");
        let output = ws
            .cmd()
            .env("HMM_LOG_FORMAT", "jsonl")
            .env("HMM_LOG", "info")
            .args(["evaluate", "-m", path_str(&model), "-s", path_str(&seq)])
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(stdout["command"], "evaluate");

        let stderr = String::from_utf8(output.stderr).unwrap();
        let events: Vec<serde_json::Value> = stderr
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert!(events.iter().any(|e| e["event"] == "model.loaded"));
        assert!(events
            .iter()
            .all(|e| e["run_id"] == stdout["run_id"]));
    }
}
