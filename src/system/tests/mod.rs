use super::testing::{FakeRunner, Response};
use super::*;
use crate::core::{redact, ValidationError};

#[test]
fn test_dry_run_never_executes() {
    let runner = SystemRunner::new(ClientMode::DryRun);
    // Would fail with Missing if it were spawned
    let invocation = Invocation::mutate("definitely-not-a-real-tool-xyz").arg("--go");

    let output = runner.run(&invocation).unwrap();
    assert!(output.success());
    assert!(output.stdout.is_empty());
    assert!(runner.spawn_detached(&invocation).is_ok());
}

#[test]
fn test_dry_run_still_validates() {
    let runner = SystemRunner::new(ClientMode::DryRun);
    let invocation = Invocation::query("nmcli").arg("bad\narg");

    assert!(matches!(
        runner.run(&invocation),
        Err(ToolError::InvalidArgument(ValidationError::ControlCharacters(_)))
    ));
}

#[test]
fn test_read_only_rejects_mutations() {
    let runner = SystemRunner::new(ClientMode::ReadOnly);
    let invocation = Invocation::mutate("nmcli").args(["radio", "wifi", "off"]);

    match runner.run(&invocation) {
        Err(ToolError::ReadOnly(line)) => assert_eq!(line, "nmcli radio wifi off"),
        other => panic!("Expected ReadOnly, got: {:?}", other),
    }
    assert!(runner.spawn_detached(&invocation).is_err());
}

#[test]
fn test_missing_executable() {
    let runner = SystemRunner::new(ClientMode::Live);
    let invocation = Invocation::query("definitely-not-a-real-tool-xyz");

    assert!(matches!(runner.run(&invocation), Err(ToolError::Missing(_))));
}

#[cfg(unix)]
#[test]
fn test_live_captures_stdout_and_exit_code() {
    let runner = SystemRunner::new(ClientMode::Live);

    let output = runner
        .run(&Invocation::query("sh").args(["-c", "echo hello"]))
        .unwrap();
    assert_eq!(output.stdout, "hello\n");

    match runner.run(&Invocation::query("sh").args(["-c", "echo oops >&2; exit 3"])) {
        Err(ToolError::Failed { code, stderr, .. }) => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "oops");
        }
        other => panic!("Expected Failed, got: {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_timeout_kills_child() {
    let runner = SystemRunner::new(ClientMode::Live);
    let invocation = Invocation::query("sleep")
        .arg("5")
        .with_timeout(Duration::from_millis(200));

    let started = Instant::now();
    assert!(matches!(
        runner.run(&invocation),
        Err(ToolError::TimedOut { .. })
    ));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[cfg(unix)]
#[test]
fn test_locale_is_fixed() {
    let runner = SystemRunner::new(ClientMode::Live);
    let output = runner
        .run(&Invocation::query("sh").args(["-c", "printf %s \"$LC_ALL\""]))
        .unwrap();
    assert_eq!(output.stdout, "C");
}

#[test]
fn test_secret_args_are_masked() {
    let invocation = Invocation::mutate("nmcli")
        .args(["device", "wifi", "connect", "Home"])
        .arg("password")
        .secret_arg("hunter22");

    assert_eq!(
        invocation.command_line(),
        "nmcli device wifi connect Home password hunter22"
    );
    assert!(!invocation.display_line().contains("hunter22"));
    assert!(invocation.display_line().ends_with("password ********"));
}

#[test]
fn test_sensitive_args_masked_when_redacting() {
    let invocation = Invocation::mutate("nmcli")
        .args(["connection", "up"])
        .sensitive_arg("HomeNetwork");

    redact::set_enabled(true);
    let redacted = invocation.display_line();
    redact::set_enabled(false);

    assert_eq!(redacted, "nmcli connection up H***k");
    assert_eq!(invocation.display_line(), "nmcli connection up HomeNetwork");
    assert_eq!(invocation.command_line(), "nmcli connection up HomeNetwork");
}

#[test]
fn test_which_finds_shell() {
    #[cfg(unix)]
    assert!(which("sh").is_some());
    assert!(which("definitely-not-a-real-tool-xyz").is_none());
}

#[test]
fn test_fake_runner_repeats_last_response() {
    let fake = FakeRunner::new();
    fake.on("pactl get-sink-mute @DEFAULT_SINK@", "Mute: no")
        .on("pactl get-sink-mute @DEFAULT_SINK@", "Mute: yes")
        .respond("usbguard list-devices", Response::Missing);

    let query = Invocation::query("pactl").args(["get-sink-mute", "@DEFAULT_SINK@"]);
    assert_eq!(fake.stdout(&query).unwrap(), "Mute: no");
    assert_eq!(fake.stdout(&query).unwrap(), "Mute: yes");
    assert_eq!(fake.stdout(&query).unwrap(), "Mute: yes");

    assert!(matches!(
        fake.run(&Invocation::query("usbguard").arg("list-devices")),
        Err(ToolError::Missing(_))
    ));
    assert_eq!(fake.calls().len(), 4);
}

#[test]
fn test_allow_write_follows_runner_mode() {
    assert!(allow_write(&SystemRunner::new(ClientMode::Live), "settings.json").unwrap());
    assert!(!allow_write(&SystemRunner::new(ClientMode::DryRun), "settings.json").unwrap());
    assert!(matches!(
        allow_write(&SystemRunner::new(ClientMode::ReadOnly), "settings.json"),
        Err(ToolError::ReadOnly(_))
    ));
    assert!(!allow_write(&FakeRunner::dry_run(), "settings.json").unwrap());
    assert!(allow_write(&FakeRunner::new(), "settings.json").unwrap());
}
