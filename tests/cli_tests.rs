use std::process::{Command, Output};

fn processview(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_processview"));
    command
        .args(args)
        .env_remove("PROCESSVIEW_PIPELINE")
        .env_remove("PROCESSVIEW_HOST")
        .env_remove("PROCESSVIEW_PORT")
        .env_remove("PROCESSVIEW_TICK_MS")
        .env_remove("PROCESSVIEW_MARGIN")
        .env_remove("PROCESSVIEW_COLOR")
        .env("NO_COLOR", "1");
    command
}

fn run(command: &mut Command) -> (Output, String) {
    let output = command.output().expect("run processview");
    let stderr = String::from_utf8(output.stderr.clone()).expect("utf8 stderr");
    (output, stderr)
}

#[test]
fn help_prints_usage_and_succeeds() {
    let (output, stderr) = run(&mut processview(&["--help"]));
    assert!(output.status.success());
    assert!(stderr.starts_with("processview\n\nUSAGE:"));
    assert!(stderr.contains("PROCESSVIEW_PIPELINE"));
}

#[test]
fn unknown_argument_exits_with_usage_error() {
    let (output, stderr) = run(&mut processview(&["--verbose"]));
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("[error] Invalid command arguments"));
    assert!(stderr.contains("unknown argument: --verbose"));
    assert!(stderr.contains("USAGE:"));
    assert!(!stderr.contains('\u{1b}'));
}

#[test]
fn missing_pipeline_names_the_environment_variable() {
    let (output, stderr) = run(&mut processview(&[]));
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("[error] Dashboard failed"));
    assert!(stderr.contains("set PROCESSVIEW_PIPELINE or pass --pipeline"));
    assert!(stderr.contains("hint:"));
}

#[test]
fn piped_stdout_is_refused_before_binding() {
    let (output, stderr) = run(
        processview(&["--port", "1"]).env("PROCESSVIEW_PIPELINE", "fetch###curl:::build###make"),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("stdout is not a terminal"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_environment_override_is_reported() {
    let (output, stderr) = run(
        processview(&["--pipeline", "fetch"]).env("PROCESSVIEW_PORT", "not-a-port"),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("PROCESSVIEW_PORT"), "{stderr}");
}
