use crate::core::parser::pactl::{
    first_percentage, parse_blocks, parse_mute, parse_short_list, parse_sink_inputs,
    parse_sinks, parse_source_outputs, parse_sources, SINK_HEADER,
};

/// Helper: Two sinks as printed by `pactl list sinks` under LC_ALL=C
const SINKS: &str = "Sink #0\n\
\tState: SUSPENDED\n\
\tName: alsa_output.pci-0000_00_1f.3.analog-stereo\n\
\tDescription: Built-in Audio Analog Stereo\n\
\tDriver: PipeWire\n\
\tMute: no\n\
\tVolume: front-left: 32768 /  50% / -18.06 dB,   front-right: 32768 /  50% / -18.06 dB\n\
\t        balance 0.00\n\
\tBase Volume: 65536 / 100% / 0.00 dB\n\
\tProperties:\n\
\t\tdevice.description = \"Built-in Audio Analog Stereo\"\n\
\t\tdevice.icon_name = \"audio-card-analog\"\n\
\tPorts:\n\
\t\tanalog-output-speaker: Speakers (type: Speaker, priority: 10000, available)\n\
\tActive Port: analog-output-speaker\n\
\n\
Sink #57\n\
\tState: RUNNING\n\
\tName: bluez_output.AA_BB_CC_DD_EE_FF.1\n\
\tDescription: WH-1000XM4\n\
\tMute: yes\n\
\tVolume: front-left: 52428 /  80% / -5.81 dB,   front-right: 52428 /  80% / -5.81 dB\n\
\tProperties:\n\
\t\tapi.bluez5.address = \"AA:BB:CC:DD:EE:FF\"\n";

const SINK_INPUTS: &str = "Sink Input #101\n\
\tDriver: PipeWire\n\
\tSink: 57\n\
\tMute: no\n\
\tVolume: front-left: 65536 / 100% / 0.00 dB,   front-right: 65536 / 100% / 0.00 dB\n\
\tProperties:\n\
\t\tmedia.name = \"AudioStream\"\n\
\t\tapplication.name = \"Firefox\"\n\
\t\tapplication.process.binary = \"firefox\"\n\
\n\
Sink Input #102\n\
\tSink: 0\n\
\tMute: yes\n\
\tVolume: mono: 26214 /  40% / -23.88 dB\n\
\tProperties:\n\
\t\tmedia.name = \"System Sounds\"\n\
\n\
Sink Input #103\n\
\tSink: 0\n\
\tProperties:\n\
\t\tapplication.name = \"No Volume\"\n\
\n\
Sink Input #104\n\
\tSink: 0\n\
\tVolume: mono: 26214 /  40% / -23.88 dB\n\
\tProperties:\n\
\t\tapplication.name = \"Spotify\"\n\
\t\tapplication.icon_name = \"spotify-client\"\n\
\t\tapplication.process.binary = \"spotify\"\n";

#[test]
fn test_parse_sink_blocks() {
    let sinks = parse_sinks(SINKS, Some("bluez_output.AA_BB_CC_DD_EE_FF.1"));
    assert_eq!(sinks.len(), 2, "Should find both sink blocks");

    let speaker = &sinks[0];
    assert_eq!(speaker.id, 0);
    assert_eq!(speaker.name, "alsa_output.pci-0000_00_1f.3.analog-stereo");
    assert_eq!(speaker.description, "Built-in Audio Analog Stereo");
    assert_eq!(speaker.state, "SUSPENDED");
    assert_eq!(speaker.volume, Some(50));
    assert!(!speaker.muted);
    assert_eq!(speaker.active_port.as_deref(), Some("analog-output-speaker"));
    assert!(!speaker.active, "Speaker is not the default sink");

    let headset = &sinks[1];
    assert_eq!(headset.id, 57);
    assert!(headset.muted);
    assert_eq!(headset.volume, Some(80));
    assert!(headset.active, "Default sink should be marked active");
    assert_eq!(headset.active_port, None);
}

#[test]
fn test_properties_are_collected() {
    let blocks = parse_blocks(SINKS, SINK_HEADER);
    assert_eq!(
        blocks[0].property("device.icon_name"),
        Some("audio-card-analog")
    );
    // Port lines are not properties and not fields
    assert_eq!(blocks[0].field("analog-output-speaker"), None);
    assert_eq!(blocks[0].field("Base Volume"), Some("65536 / 100% / 0.00 dB"));
}

#[test]
fn test_sink_header_does_not_match_sink_input() {
    let blocks = parse_blocks(SINK_INPUTS, SINK_HEADER);
    assert!(blocks.is_empty(), "'Sink Input #' is not a 'Sink #' header");
}

#[test]
fn test_sources_flag_monitors() {
    let output = "Source #1\n\
\tName: alsa_output.pci-0000_00_1f.3.analog-stereo.monitor\n\
\tDescription: Monitor of Built-in Audio\n\
\tMute: no\n\
\tVolume: front-left: 65536 / 100% / 0.00 dB\n\
Source #2\n\
\tName: alsa_input.usb-Blue_Yeti-00.analog-stereo\n\
\tDescription: Yeti Stereo Microphone\n\
\tMute: no\n\
\tVolume: front-left: 45875 /  70% / -9.29 dB\n";

    let sources = parse_sources(output, Some("alsa_input.usb-Blue_Yeti-00.analog-stereo"));
    assert_eq!(sources.len(), 2);
    assert!(sources[0].monitor);
    assert!(!sources[1].monitor);
    assert!(sources[1].active);
    assert_eq!(sources[1].volume, Some(70));
}

#[test]
fn test_application_streams() {
    let apps = parse_sink_inputs(SINK_INPUTS);
    assert_eq!(apps.len(), 3, "Stream without a volume should be skipped");

    let firefox = &apps[0];
    assert_eq!(firefox.id, 101);
    assert_eq!(firefox.name, "Firefox", "application.name wins over media.name");
    assert_eq!(firefox.binary.as_deref(), Some("firefox"));
    assert_eq!(firefox.icon, "firefox", "Icon falls back to the binary");
    assert_eq!(firefox.volume, 100);
    assert_eq!(firefox.device, Some(57));

    let sounds = &apps[1];
    assert_eq!(sounds.name, "System Sounds", "media.name used when no application.name");
    assert_eq!(sounds.icon, "system-sounds", "Icon falls back to the dashed name");
    assert!(sounds.muted);

    let spotify = &apps[2];
    assert_eq!(spotify.icon, "spotify-client", "application.icon_name wins");
}

#[test]
fn test_recording_streams_use_source_field() {
    let output = "Source Output #7\n\
\tSource: 2\n\
\tMute: no\n\
\tVolume: mono: 65536 / 100% / 0.00 dB\n\
\tProperties:\n\
\t\tapplication.name = \"OBS Studio\"\n";

    let streams = parse_source_outputs(output);
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].device, Some(2));
    assert_eq!(streams[0].icon, "obs-studio");
}

#[test]
fn test_first_percentage() {
    let output = "Volume: front-left: 45875 /  70% / -9.29 dB,   front-right: 39321 /  60% / -13.31 dB";
    assert_eq!(first_percentage(output), Some(70));
    assert_eq!(first_percentage("no volume here"), None);
}

#[test]
fn test_parse_mute() {
    assert!(parse_mute("Mute: yes\n"));
    assert!(!parse_mute("Mute: no\n"));
}

#[test]
fn test_short_list() {
    let output = "0\talsa_output.pci-0000_00_1f.3.analog-stereo\tPipeWire\ts32le 2ch 48000Hz\tSUSPENDED\n\
57\tbluez_output.AA_BB_CC_DD_EE_FF.1\tPipeWire\ts16le 2ch 48000Hz\tRUNNING\n\n";

    let rows = parse_short_list(output);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], ("57".to_string(), "bluez_output.AA_BB_CC_DD_EE_FF.1".to_string()));
}
