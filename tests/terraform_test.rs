//! Tests for the Terraform façade
//!
//! All cases run against the recording mock; no terraform binary is needed.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use tfwrap::application::ApplicationError;
use tfwrap::config::{ChdirStyle, Settings};
use tfwrap::domain::{OptionSet, OptionValue};
use tfwrap::infrastructure::ProcessOutput;
use tfwrap::Terraform;

use common::RecordingRunner;

fn terraform_with(runner: &Arc<RecordingRunner>) -> Terraform {
    tfwrap::util::testing::init_test_setup();
    Terraform::with_runner(&Settings::default(), runner.clone())
}

// ============================================================
// Default option merging
// ============================================================

#[test]
fn given_no_overrides_when_applying_then_standard_defaults_encoded() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);

    tf.apply(None, OptionSet::new()).unwrap();

    assert_eq!(
        runner.last_spec().args,
        vec!["apply", "-auto-approve=true", "-no-color", "-input=false"]
    );
}

#[test]
fn given_instance_defaults_when_planning_then_merged_underneath() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);
    tf.targets = vec!["aws_instance.a".to_string(), "aws_instance.b".to_string()];
    tf.variables = BTreeMap::from([("region".to_string(), "eu-1".to_string())]);
    tf.parallelism = Some(4);

    tf.plan(None, OptionSet::new()).unwrap();

    assert_eq!(
        runner.last_spec().args,
        vec![
            "plan",
            "-detailed-exitcode",
            "-target=aws_instance.a",
            "-target=aws_instance.b",
            "-var='region=eu-1'",
            "-parallelism=4",
            "-no-color",
            "-input=false"
        ]
    );
}

#[test]
fn given_caller_override_when_applying_then_default_not_duplicated() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);

    tf.apply(None, OptionSet::new().with("input", true)).unwrap();

    let args = runner.last_spec().args;
    assert!(args.contains(&"-input=true".to_string()));
    assert!(!args.contains(&"-input=false".to_string()));
}

#[test]
fn given_unset_override_when_planning_then_default_cancelled() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);
    tf.variables = BTreeMap::from([("region".to_string(), "eu-1".to_string())]);

    tf.plan(None, OptionSet::new().with("var", OptionValue::Unset))
        .unwrap();

    let args = runner.last_spec().args;
    assert!(!args.iter().any(|a| a.starts_with("-var=")));
}

#[test]
fn given_lifecycle_commands_when_run_then_command_specific_defaults() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);

    tf.destroy(None, OptionSet::new()).unwrap();
    assert!(runner
        .last_spec()
        .args
        .contains(&"-auto-approve=true".to_string()));

    tf.init(None, OptionSet::new()).unwrap();
    let args = runner.last_spec().args;
    assert!(args.contains(&"-reconfigure".to_string()));
    assert!(args.contains(&"-backend=true".to_string()));
}

// ============================================================
// Directory targeting
// ============================================================

#[test]
fn given_chdir_style_when_planning_dir_then_global_option_precedes_command() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);

    tf.plan(Some("infra"), OptionSet::new()).unwrap();

    let args = runner.last_spec().args;
    assert_eq!(args[0], "-chdir=infra");
    assert_eq!(args[1], "plan");
}

#[test]
fn given_positional_style_when_planning_dir_then_trailing_before_options() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);
    tf.chdir_style = ChdirStyle::Positional;

    tf.plan(Some("infra"), OptionSet::new()).unwrap();

    let args = runner.last_spec().args;
    assert_eq!(args[0], "plan");
    assert_eq!(args[1], "infra");
    assert!(args[2].starts_with('-'));
}

// ============================================================
// Output parsing
// ============================================================

#[test]
fn given_named_output_when_reading_then_value_member_unwrapped() {
    let runner = Arc::new(RecordingRunner::new());
    runner.respond_stdout(0, "{\"value\": \"10.0.0.1\", \"type\": \"string\"}\n");
    let mut tf = terraform_with(&runner);

    let value = tf.output("ip").unwrap();

    assert_eq!(value, Some(json!("10.0.0.1")));
    let spec = runner.last_spec();
    assert_eq!(spec.args[0], "output");
    assert_eq!(spec.args[1], "ip");
    assert!(spec.args.contains(&"-json".to_string()));
}

#[test]
fn given_all_outputs_when_reading_then_full_object_returned() {
    let runner = Arc::new(RecordingRunner::new());
    runner.respond_stdout(0, "{\"ip\": {\"value\": \"10.0.0.1\"}}");
    let mut tf = terraform_with(&runner);

    let value = tf.outputs().unwrap();

    assert_eq!(value, Some(json!({"ip": {"value": "10.0.0.1"}})));
}

#[test]
fn given_failed_output_command_when_reading_then_none() {
    let runner = Arc::new(RecordingRunner::new());
    runner.respond_with(ProcessOutput {
        code: 1,
        stdout: Some(String::new()),
        stderr: Some("no state".to_string()),
    });
    let mut tf = terraform_with(&runner);

    assert_eq!(tf.output("ip").unwrap(), None);
}

// ============================================================
// Workspaces
// ============================================================

#[test]
fn given_listing_when_listing_workspaces_then_names_parsed() {
    let runner = Arc::new(RecordingRunner::new());
    runner.respond_stdout(0, "  default\n* staging\n  prod\n");
    let mut tf = terraform_with(&runner);

    let names = tf.workspace_list().unwrap();

    assert_eq!(names, vec!["default", "staging", "prod"]);
    assert_eq!(runner.last_spec().args[..2], ["workspace", "list"]);
}

#[test]
fn given_workspace_select_when_run_then_name_positional() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);

    tf.workspace_select("staging").unwrap();

    assert_eq!(
        runner.last_spec().args[..3],
        ["workspace", "select", "staging"]
    );
}

// ============================================================
// State snapshot lifecycle
// ============================================================

fn seeded_state_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let state = json!({
        "version": 4,
        "outputs": {"ip": {"value": "10.0.0.1", "type": "string"}},
        "resources": []
    });
    std::fs::write(
        temp.path().join("terraform.tfstate"),
        serde_json::to_string(&state).unwrap(),
    )
    .unwrap();
    temp
}

#[test]
fn given_successful_invocation_when_state_exists_then_snapshot_refreshed() {
    let temp = seeded_state_dir();
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);
    tf.working_dir = Some(temp.path().to_path_buf());

    assert!(tf.state().is_empty());
    tf.apply(None, OptionSet::new()).unwrap();

    assert_eq!(tf.state().output("ip").unwrap(), &json!("10.0.0.1"));
}

#[test]
fn given_failed_invocation_when_state_exists_then_snapshot_untouched() {
    let temp = seeded_state_dir();
    let runner = Arc::new(RecordingRunner::new());
    runner.respond_with(ProcessOutput {
        code: 1,
        stdout: Some(String::new()),
        stderr: Some("boom".to_string()),
    });
    let mut tf = terraform_with(&runner);
    tf.working_dir = Some(temp.path().to_path_buf());

    let result = tf.apply(None, OptionSet::new()).unwrap();

    assert_eq!(result.code, 1);
    assert!(tf.state().is_empty());
}

#[test]
fn given_malformed_state_when_invocation_succeeds_then_result_still_returned() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("terraform.tfstate"), "{ nope").unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);
    tf.working_dir = Some(temp.path().to_path_buf());

    // State reading is a best-effort follow-up; the invocation succeeded.
    let result = tf.apply(None, OptionSet::new()).unwrap();

    assert_eq!(result.code, 0);
    assert!(tf.state().is_empty());
}

#[test]
fn given_explicit_read_state_when_malformed_then_parse_failure_raised() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("terraform.tfstate"), "{ nope").unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);
    tf.working_dir = Some(temp.path().to_path_buf());

    let err = tf.read_state().unwrap_err();

    assert!(matches!(err, ApplicationError::StateParse { .. }));
}

// ============================================================
// Strict mode and environment plumbing
// ============================================================

#[test]
fn given_strict_mode_when_command_fails_then_error_with_stderr() {
    let runner = Arc::new(RecordingRunner::new());
    runner.respond_with(ProcessOutput {
        code: 1,
        stdout: Some(String::new()),
        stderr: Some("lock held".to_string()),
    });
    let mut tf = terraform_with(&runner);
    tf.check = true;

    let err = tf.apply(None, OptionSet::new()).unwrap_err();

    match err {
        ApplicationError::CommandFailed { code, stderr } => {
            assert_eq!(code, 1);
            assert_eq!(stderr.as_deref(), Some("lock held"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn given_instance_env_when_invoking_then_passed_to_runner() {
    let runner = Arc::new(RecordingRunner::new());
    let mut tf = terraform_with(&runner);
    tf.env = BTreeMap::from([("TF_LOG".to_string(), "DEBUG".to_string())]);
    tf.inherit_env = false;

    tf.plan(None, OptionSet::new()).unwrap();

    let spec = runner.last_spec();
    assert_eq!(spec.env.get("TF_LOG").map(String::as_str), Some("DEBUG"));
    assert!(!spec.inherit_env);
}
