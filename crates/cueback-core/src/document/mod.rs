//! Backup document assembly.
//!
//! Walks the XML tree collaborator, applies the attribute-default rules of
//! the backup schema and invokes the payload decoders inline. A decode
//! failure on one fixture or cue never aborts the rest of the document;
//! only a missing `core` root or unparseable XML is fatal.

use std::fs;
use std::path::Path;

use thiserror::Error;

pub mod tree;

use tree::{XmlElement, XmlError};

use crate::payload::frame::decode_frame;
use crate::payload::personality::decode_personality;
use crate::{
    Action, ActionList, BackupDocument, BackupHeader, Cue, Fixture, FixturePlayback, FramePayload,
    Playback, Precedence, Task, TaskParameter, Track, Trigger,
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] XmlError),
    #[error("invalid backup file: missing <core> root element")]
    MissingCore,
}

/// Read and decode a backup file.
pub fn parse_backup_file(path: &Path) -> Result<BackupDocument, DocumentError> {
    let xml = fs::read_to_string(path)?;
    parse_backup_xml(&xml)
}

/// Decode a backup document from its XML text.
pub fn parse_backup_xml(xml: &str) -> Result<BackupDocument, DocumentError> {
    let root = XmlElement::parse(xml)?;
    if root.name() != "core" {
        return Err(DocumentError::MissingCore);
    }

    Ok(BackupDocument {
        header: parse_header(&root),
        patch: parse_patch(&root),
        playbacks: parse_playbacks(&root),
        fixture_playbacks: parse_fixture_playbacks(&root),
        show_control: parse_show_control(&root),
        tracks: parse_tracks(&root),
    })
}

fn attr(el: &XmlElement, name: &str) -> String {
    el.attr(name).unwrap_or_default().to_string()
}

// String attributes keep an empty value; the default applies only when the
// attribute is absent.
fn attr_or(el: &XmlElement, name: &str, default: &str) -> String {
    el.attr(name).unwrap_or(default).to_string()
}

fn nonempty_attr<'a>(el: &'a XmlElement, name: &str) -> Option<&'a str> {
    el.attr(name).filter(|value| !value.is_empty())
}

// Absent or non-numeric values resolve to zero.
fn attr_num<T: std::str::FromStr + Default>(el: &XmlElement, name: &str) -> T {
    el.attr(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

// Only the literal "true" (any case) is truthy; absent and empty fall back
// to the default.
fn attr_bool(el: &XmlElement, name: &str, default: bool) -> bool {
    match nonempty_attr(el, name) {
        Some(value) => value.eq_ignore_ascii_case("true"),
        None => default,
    }
}

fn parse_header(root: &XmlElement) -> BackupHeader {
    BackupHeader {
        device: attr(root, "device"),
        version_pcb: attr(root, "version_pcb"),
        version_firmware: attr(root, "version_firmware"),
        pcb_serial: attr(root, "pcb_serial"),
        mac_address: attr(root, "mac_address"),
        backup_utility: attr(root, "backup_utility"),
        utility_version: attr(root, "utility_version"),
        protocol_version: attr(root, "protocol_version"),
    }
}

fn parse_patch(root: &XmlElement) -> Vec<Fixture> {
    let mut fixtures: Vec<Fixture> = root
        .child("patch")
        .map(|patch| patch.children("fixture").map(parse_fixture).collect())
        .unwrap_or_default();
    fixtures.sort_by_key(|fixture| fixture.index);
    fixtures
}

fn parse_fixture(el: &XmlElement) -> Fixture {
    Fixture {
        index: attr_num(el, "index"),
        label: attr(el, "label"),
        address: attr_num(el, "address"),
        virtual_dimmer: attr_bool(el, "virtualdimmer", false),
        decoded_personality: decode_personality(el.attr("personality")),
        personality: attr(el, "personality"),
        uid: nonempty_attr(el, "uid").map(str::to_string),
        raw_xml: el.to_xml(),
    }
}

fn parse_playbacks(root: &XmlElement) -> Vec<Playback> {
    let Some(section) = root.child("playbacks") else {
        return Vec::new();
    };

    section
        .children("playback")
        .enumerate()
        .map(|(index, el)| Playback {
            // Plain playbacks and their cues are numbered by iteration
            // order; any index attribute is ignored. Fixture playbacks read
            // theirs instead.
            index: index as u32,
            label: attr(el, "label"),
            release: attr_or(el, "release", "0s"),
            precedence: Precedence::from_attr(el.attr("precedence")),
            repeat: attr_or(el, "repeat", "Off"),
            timecode_offset: attr_or(el, "timecode_offset", "00:00:00.00"),
            cues: parse_plain_cues(el),
        })
        .collect()
}

fn parse_plain_cues(playback: &XmlElement) -> Vec<Cue> {
    let Some(cues) = playback.child("cues") else {
        return Vec::new();
    };

    cues.children("cue")
        .enumerate()
        .map(|(cue_index, el)| Cue {
            index: cue_index as u32,
            label: "Cue".to_string(),
            duration: attr_or(el, "duration", "halt"),
            condition: nonempty_attr(el, "condition").map(str::to_string),
            fade: el.attr("fade").map(str::to_string),
            frames: Vec::new(),
            frame_fx: Vec::new(),
            raw_xml: None,
        })
        .collect()
}

fn parse_fixture_playbacks(root: &XmlElement) -> Vec<FixturePlayback> {
    let Some(section) = root.child("fixture_playbacks") else {
        return Vec::new();
    };

    let mut playbacks: Vec<FixturePlayback> = section
        .children("playback")
        .map(parse_fixture_playback)
        .collect();
    playbacks.sort_by_key(|playback| playback.index);
    playbacks
}

fn parse_fixture_playback(el: &XmlElement) -> FixturePlayback {
    FixturePlayback {
        index: attr_num(el, "index"),
        label: attr(el, "label"),
        release: attr_or(el, "release", "0s"),
        precedence: Precedence::from_attr(el.attr("precedence")),
        repeat: attr_or(el, "repeat", "Off"),
        timecode_enabled: attr_bool(el, "timecode_enabled", false),
        timecode_offset: attr_or(el, "timecode_offset", "00:00:00.00"),
        cues: el
            .descendants("cue")
            .into_iter()
            .map(parse_fixture_cue)
            .collect(),
        raw_xml: el.to_xml(),
    }
}

fn parse_fixture_cue(el: &XmlElement) -> Cue {
    Cue {
        index: attr_num(el, "index"),
        label: attr_or(el, "label", "Cue"),
        duration: attr_or(el, "duration", "halt"),
        condition: None,
        fade: el.attr("fade").map(str::to_string),
        frames: frame_payloads(el, "frame"),
        frame_fx: frame_payloads(el, "frame_fx"),
        raw_xml: Some(el.to_xml()),
    }
}

fn frame_payloads(cue: &XmlElement, name: &str) -> Vec<FramePayload> {
    cue.descendants(name)
        .into_iter()
        .filter(|el| !el.text().is_empty())
        .map(|el| FramePayload {
            data: el.text().to_string(),
            decoded: decode_frame(el.text()),
        })
        .collect()
}

fn parse_show_control(root: &XmlElement) -> ActionList {
    let Some(actionlist) = root
        .child("show_control")
        .and_then(|section| section.child("actionlist"))
    else {
        return ActionList {
            enabled: false,
            source: String::new(),
            actions: Vec::new(),
        };
    };

    let actions = actionlist
        .descendants("action")
        .into_iter()
        .map(parse_action)
        .collect();

    ActionList {
        enabled: attr_bool(actionlist, "enabled", true),
        source: attr_or(actionlist, "source", "UDP"),
        actions,
    }
}

fn parse_action(el: &XmlElement) -> Action {
    let trigger = el.child("trigger");
    let tasks = el
        .child("tasks")
        .map(|tasks| tasks.children("task").map(parse_task).collect())
        .unwrap_or_default();

    Action {
        label: attr(el, "label"),
        trigger: Trigger {
            trigger_type: trigger.map(|t| attr(t, "type")).unwrap_or_default(),
            value: trigger.map(|t| attr(t, "value")).unwrap_or_default(),
            flank: trigger
                .map(|t| attr_or(t, "flank", "Change"))
                .unwrap_or_else(|| "Change".to_string()),
        },
        tasks,
        raw_xml: el.to_xml(),
    }
}

fn parse_task(el: &XmlElement) -> Task {
    Task {
        task_type: attr(el, "type"),
        feature: attr(el, "feature"),
        function: attr(el, "function"),
        parameters: el
            .descendants("parameter")
            .into_iter()
            .map(|p| TaskParameter {
                index: attr_num(p, "index"),
                param_type: attr(p, "type"),
                value: p.text().to_string(),
            })
            .collect(),
    }
}

fn parse_tracks(root: &XmlElement) -> Vec<Track> {
    let Some(section) = root.child("tracks") else {
        return Vec::new();
    };

    let mut tracks: Vec<Track> = section
        .children("track")
        .map(|el| Track {
            index: attr_num(el, "index"),
            label: attr(el, "label"),
            version: attr(el, "version"),
            frames: attr_num(el, "frames"),
            filesize: attr_num(el, "filesize"),
            sample_rate: attr_num(el, "sample_rate"),
            external: attr_bool(el, "external", false),
        })
        .collect();
    tracks.sort_by_key(|track| track.index);
    tracks
}
