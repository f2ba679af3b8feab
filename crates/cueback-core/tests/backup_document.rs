use std::path::{Path, PathBuf};

use cueback_core::{
    PersonalityFormat, Precedence, build_dmx_state, make_report, map_fixture_channels,
    parse_backup_file,
};

fn sample_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("sample_backup.xml")
}

#[test]
fn decodes_header_and_sections() {
    let backup = parse_backup_file(&sample_path()).expect("parse sample");

    assert_eq!(backup.header.device, "CueCon3");
    assert_eq!(backup.header.version_firmware, "2.04");
    assert_eq!(backup.header.mac_address, "00:11:22:33:44:55");
    assert_eq!(backup.header.protocol_version, "2");

    assert_eq!(backup.patch.len(), 4);
    assert_eq!(backup.playbacks.len(), 1);
    assert_eq!(backup.fixture_playbacks.len(), 2);
    assert_eq!(backup.show_control.actions.len(), 1);
    assert_eq!(backup.tracks.len(), 2);
}

#[test]
fn fixtures_sorted_with_decoded_personalities() {
    let backup = parse_backup_file(&sample_path()).expect("parse sample");

    let labels: Vec<&str> = backup
        .patch
        .iter()
        .map(|fixture| fixture.label.as_str())
        .collect();
    assert_eq!(labels, vec!["LED Bar", "Spot", "Strobe", "Relay"]);

    let led_bar = &backup.patch[0];
    let personality = led_bar.decoded_personality.as_ref().expect("complex decodes");
    assert_eq!(personality.format, PersonalityFormat::Complex);
    assert_eq!(personality.channel_count, 6);
    assert_eq!(personality.header_value, Some(3_000_000_001));
    assert_eq!(
        personality.format_trait_ids(),
        "1007, 1001, 1002*, 4001, 4002*, 2001"
    );
    assert_eq!(led_bar.uid.as_deref(), Some("f0-aa-01"));

    let spot = &backup.patch[1];
    let personality = spot.decoded_personality.as_ref().expect("simple decodes");
    assert_eq!(personality.format, PersonalityFormat::Simple);
    assert_eq!(personality.channel_count, 4);

    // Malformed base64 stays isolated to its fixture.
    let strobe = &backup.patch[2];
    assert_eq!(strobe.personality, "%%%");
    assert!(strobe.decoded_personality.is_none());

    let relay = &backup.patch[3];
    assert!(relay.personality.is_empty());
    assert!(relay.decoded_personality.is_none());
    assert!(relay.virtual_dimmer);
    assert!(relay.raw_xml.contains("Relay"));
}

#[test]
fn plain_playback_defaults_and_iteration_order_indices() {
    let backup = parse_backup_file(&sample_path()).expect("parse sample");

    let playback = &backup.playbacks[0];
    assert_eq!(playback.index, 0);
    assert_eq!(playback.label, "Room");
    assert_eq!(playback.release, "2s");
    assert_eq!(playback.precedence, Precedence::Ltp);
    assert_eq!(playback.repeat, "Loop");
    assert_eq!(playback.timecode_offset, "00:00:00.00");

    // Cue index attributes are ignored for plain playbacks.
    assert_eq!(playback.cues[0].index, 0);
    assert_eq!(playback.cues[1].index, 1);
    assert_eq!(playback.cues[0].duration, "5s");
    assert_eq!(playback.cues[0].condition.as_deref(), Some("dark"));
    assert_eq!(playback.cues[1].duration, "halt");
}

#[test]
fn fixture_playbacks_sorted_and_frames_decoded() {
    let backup = parse_backup_file(&sample_path()).expect("parse sample");

    assert_eq!(backup.fixture_playbacks[0].label, "Look A");
    assert_eq!(backup.fixture_playbacks[1].label, "Look B");
    assert_eq!(backup.fixture_playbacks[1].precedence, Precedence::Htp);
    assert!(backup.fixture_playbacks[1].timecode_enabled);

    let cue = &backup.fixture_playbacks[0].cues[0];
    assert_eq!(cue.index, 0);
    assert_eq!(cue.label, "Open");
    assert_eq!(cue.fade.as_deref(), Some("2s"));
    assert_eq!(cue.frames.len(), 2);
    assert_eq!(cue.frame_fx.len(), 1);

    let first = cue.frames[0].decoded.as_ref().expect("frame decodes");
    assert_eq!(first.frame_index, 1);
    assert_eq!(first.channels.len(), 5);
    assert_eq!(first.channels[0].address, 1);
    assert_eq!(first.channels[0].value, 255);
    assert_eq!(first.channels[1].address, 2);
    assert_eq!(first.channels[1].value, 128);

    let fx = cue.frame_fx[0].decoded.as_ref().expect("fx decodes");
    assert_eq!(fx.frame_index, 9);
    assert_eq!(fx.channels[0].address, 6);
    assert_eq!(fx.channels[0].value, 1);
}

#[test]
fn maps_first_cue_state_onto_patch() {
    let backup = parse_backup_file(&sample_path()).expect("parse sample");

    let cue = &backup.fixture_playbacks[0].cues[0];
    let frame_texts: Vec<String> = cue
        .frames
        .iter()
        .map(|payload| payload.data.clone())
        .collect();

    let state = build_dmx_state(&frame_texts);
    // First frame only: the second frame's address 101 must not appear.
    assert_eq!(state.get(&1), Some(&255));
    assert_eq!(state.get(&2), Some(&128));
    assert_eq!(state.get(&4), Some(&64));
    assert_eq!(state.get(&17), Some(&200));
    assert_eq!(state.get(&19), Some(&32));
    assert_eq!(state.get(&101), None);

    let mapped = map_fixture_channels(&state, &backup.patch, 4);
    assert_eq!(mapped.len(), 2);

    let led_bar = &mapped[0];
    assert_eq!(led_bar.fixture_index, 0);
    assert_eq!(led_bar.start_address, 1);
    let values: Vec<u8> = led_bar.channels.iter().map(|ch| ch.value).collect();
    assert_eq!(values, vec![255, 128, 0, 64, 0, 0]);
    assert_eq!(led_bar.channels[2].name, "1002*");

    let spot = &mapped[1];
    assert_eq!(spot.fixture_index, 1);
    assert_eq!(spot.start_address, 17);
    let values: Vec<u8> = spot.channels.iter().map(|ch| ch.value).collect();
    assert_eq!(values, vec![200, 0, 32, 0]);
}

#[test]
fn show_control_and_tracks() {
    let backup = parse_backup_file(&sample_path()).expect("parse sample");

    let list = &backup.show_control;
    assert!(list.enabled);
    assert_eq!(list.source, "UDP");
    let action = &list.actions[0];
    assert_eq!(action.label, "Go");
    assert_eq!(action.trigger.trigger_type, "UDP");
    assert_eq!(action.trigger.flank, "Change");
    assert_eq!(action.tasks[0].function, "Start");
    assert_eq!(action.tasks[0].parameters[0].value, "1");
    assert!(action.raw_xml.contains("trigger"));

    assert_eq!(backup.tracks[0].label, "Intro");
    assert!(backup.tracks[0].external);
    assert_eq!(backup.tracks[1].filesize, 352_800);
}

#[test]
fn report_json_round_trips() {
    let backup = parse_backup_file(&sample_path()).expect("parse sample");
    let report = make_report("sample_backup.xml", 1024, backup);

    let json = serde_json::to_string_pretty(&report).expect("serialize");
    let parsed: cueback_core::Report = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(parsed.backup.patch.len(), 4);
    assert_eq!(
        parsed.backup.patch[0]
            .decoded_personality
            .as_ref()
            .map(|p| p.channel_count),
        Some(6)
    );
}
