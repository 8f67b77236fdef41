use crate::system::testing::FakeRunner;
use crate::system::ToolError;
use crate::tools::audio::*;

const SINKS: &str = "Sink #0\n\
\tState: SUSPENDED\n\
\tName: alsa_output.pci-0000_00_1f.3.analog-stereo\n\
\tDescription: Built-in Audio Analog Stereo\n\
\tMute: no\n\
\tVolume: front-left: 32768 /  50% / -18.06 dB,   front-right: 32768 /  50% / -18.06 dB\n\
\tActive Port: analog-output-speaker\n\
\n\
Sink #57\n\
\tState: RUNNING\n\
\tName: bluez_output.AA_BB_CC_DD_EE_FF.1\n\
\tDescription: WH-1000XM4\n\
\tMute: yes\n\
\tVolume: front-left: 52428 /  80% / -5.81 dB,   front-right: 52428 /  80% / -5.81 dB\n";

const SOURCES: &str = "Source #1\n\
\tState: SUSPENDED\n\
\tName: alsa_output.pci-0000_00_1f.3.analog-stereo.monitor\n\
\tDescription: Monitor of Built-in Audio\n\
\tMute: no\n\
\n\
Source #2\n\
\tState: RUNNING\n\
\tName: alsa_input.usb-Blue_Yeti-00.analog-stereo\n\
\tDescription: Yeti Stereo Microphone\n\
\tMute: no\n\
\tVolume: front-left: 45875 /  70% / -9.29 dB\n";

#[test]
fn test_get_volume_reads_first_percentage() {
    let fake = FakeRunner::new();
    fake.on(
        "pactl get-sink-volume @DEFAULT_SINK@",
        "Volume: front-left: 42598 /  65% / -11.23 dB,   front-right: 42598 /  65% / -11.23 dB\n\
         balance 0.00\n",
    );

    assert_eq!(get_volume(&fake, Direction::Output).unwrap(), 65);
}

#[test]
fn test_get_volume_without_percentage_is_parse_error() {
    let fake = FakeRunner::new();
    fake.on("pactl get-source-volume @DEFAULT_SOURCE@", "garbage");

    assert!(matches!(
        get_volume(&fake, Direction::Input),
        Err(ToolError::Parse { .. })
    ));
}

#[test]
fn test_set_volume_builds_percentage_argument() {
    let fake = FakeRunner::new();
    set_volume(&fake, Direction::Input, 35).unwrap();

    assert_eq!(fake.calls(), vec!["pactl set-source-volume @DEFAULT_SOURCE@ 35%"]);
}

#[test]
fn test_set_volume_out_of_range_never_runs() {
    let fake = FakeRunner::new();

    assert!(matches!(
        set_volume(&fake, Direction::Output, 151),
        Err(ToolError::InvalidArgument(_))
    ));
    assert!(fake.calls().is_empty());
}

#[test]
fn test_mute_round_trip() {
    let fake = FakeRunner::new();
    fake.on("pactl get-sink-mute @DEFAULT_SINK@", "Mute: yes\n");

    assert!(is_muted(&fake, Direction::Output).unwrap());
    toggle_mute(&fake, Direction::Output).unwrap();
    set_mute(&fake, Direction::Input, false).unwrap();

    assert!(fake.was_called("pactl set-sink-mute @DEFAULT_SINK@ toggle"));
    assert!(fake.was_called("pactl set-source-mute @DEFAULT_SOURCE@ 0"));
}

#[test]
fn test_list_sinks_flags_default() {
    let fake = FakeRunner::new();
    fake.on("pactl get-default-sink", "bluez_output.AA_BB_CC_DD_EE_FF.1\n")
        .on("pactl list sinks", SINKS);

    let sinks = list_sinks(&fake).unwrap();
    assert_eq!(sinks.len(), 2);
    assert!(!sinks[0].active);
    assert!(sinks[1].active);
}

#[test]
fn test_list_sinks_survives_missing_default() {
    let fake = FakeRunner::new();
    fake.fail("pactl get-default-sink", 1, "No such entity")
        .on("pactl list sinks", SINKS);

    let sinks = list_sinks(&fake).unwrap();
    assert!(sinks.iter().all(|sink| !sink.active));
}

#[test]
fn test_list_sources_hides_monitors() {
    let fake = FakeRunner::new();
    fake.on("pactl list sources", SOURCES);

    let sources = list_sources(&fake, false).unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].description, "Yeti Stereo Microphone");

    assert_eq!(list_sources(&fake, true).unwrap().len(), 2);
}

#[test]
fn test_set_default_sink_moves_streams() {
    let fake = FakeRunner::new();
    fake.on(
        "pactl list short sink-inputs",
        "101\t0\t-\tPipeWire\tfloat32le 2ch 48000Hz\n102\t0\t-\tPipeWire\ts16le 1ch 44100Hz\n",
    )
    .fail("pactl move-sink-input 102 bluez_output.X", 1, "Failure");

    set_default_sink(&fake, "bluez_output.X").unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            "pactl set-default-sink bluez_output.X",
            "pactl list short sink-inputs",
            "pactl move-sink-input 101 bluez_output.X",
            "pactl move-sink-input 102 bluez_output.X",
        ]
    );
}

#[test]
fn test_set_default_sink_rejects_odd_names() {
    let fake = FakeRunner::new();

    assert!(set_default_sink(&fake, "sink; rm -rf").is_err());
    assert!(fake.calls().is_empty());
}

#[test]
fn test_application_controls() {
    let fake = FakeRunner::new();
    set_application_volume(&fake, 101, 40).unwrap();
    move_application_to_sink(&fake, 101, "alsa_output.pci-0000_00_1f.3.analog-stereo").unwrap();
    mute_application(&fake, 101, None).unwrap();
    mute_application(&fake, 101, Some(true)).unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            "pactl set-sink-input-volume 101 40%",
            "pactl move-sink-input 101 alsa_output.pci-0000_00_1f.3.analog-stereo",
            "pactl set-sink-input-mute 101 toggle",
            "pactl set-sink-input-mute 101 1",
        ]
    );
}

#[test]
fn test_sink_icon_heuristics() {
    assert_eq!(sink_icon_name("alsa_output.x", "Headphones"), "audio-headphones-symbolic");
    assert_eq!(sink_icon_name("bluez_output.AA_BB.1", "WH-1000XM4"), "bluetooth-symbolic");
    assert_eq!(
        sink_icon_name("alsa_output.pci.hdmi-stereo", "HDMI / DisplayPort"),
        "video-display-symbolic"
    );
    assert_eq!(sink_icon_name("alsa_output.usb-Scarlett", "Focusrite"), "audio-card-symbolic");
    assert_eq!(sink_icon_name("alsa_output.pci", "Speakers"), "audio-speakers-symbolic");
}

#[test]
fn test_source_icon_heuristics() {
    assert_eq!(source_icon_name("alsa_input.usb-Webcam_C920", ""), "camera-web-symbolic");
    assert_eq!(source_icon_name("x", "Headset Microphone"), "audio-headset-symbolic");
    assert_eq!(source_icon_name("bluez_input.AA", "WH-1000XM4"), "bluetooth-symbolic");
    assert_eq!(source_icon_name("alsa_input.pci", "Internal Mic"), "audio-input-microphone-symbolic");
}

#[test]
fn test_app_icon_prefers_provided() {
    assert_eq!(app_icon_name("Firefox", "firefox-nightly"), "firefox-nightly");
    assert_eq!(app_icon_name("Google Chrome", ""), "google-chrome");
    assert_eq!(app_icon_name("spotify", ""), "spotify");
    assert_eq!(app_icon_name("Some Game", ""), "audio-x-generic-symbolic");
}

#[test]
fn test_stream_icon_prefers_known_app_over_guess() {
    let guessed = crate::core::AppStream {
        name: "Google Chrome".into(),
        binary: Some("chrome".into()),
        icon: "chrome".into(),
        ..Default::default()
    };
    assert_eq!(stream_icon(&guessed), "google-chrome");

    let supplied = crate::core::AppStream {
        name: "Firefox".into(),
        binary: Some("firefox-bin".into()),
        icon: "firefox-nightly".into(),
        ..Default::default()
    };
    assert_eq!(stream_icon(&supplied), "firefox-nightly");

    let unknown = crate::core::AppStream {
        name: "Some Game".into(),
        icon: "some-game".into(),
        ..Default::default()
    };
    assert_eq!(stream_icon(&unknown), "some-game");
}

#[test]
fn test_default_device_notification_uses_device_icon() {
    let fake = FakeRunner::new();
    fake.on("pactl list sinks", SINKS);

    notify_default_device(&fake, Direction::Output, "bluez_output.AA_BB_CC_DD_EE_FF.1");

    let sent: Vec<String> = fake
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("notify-send"))
        .collect();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("-i bluetooth-symbolic"));
    assert!(sent[0].ends_with("Output: WH-1000XM4"));
}
