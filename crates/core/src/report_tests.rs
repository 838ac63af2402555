// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    screenshot = { "screenshot", SignalKind::Screenshot },
    video = { "video", SignalKind::Video },
    har = { "har", SignalKind::Har },
    log = { "log", SignalKind::Log },
)]
fn kind_round_trips_through_column_tag(tag: &str, kind: SignalKind) {
    assert_eq!(SignalKind::parse(tag), Some(kind));
    assert_eq!(kind.to_string(), tag);
}

#[test]
fn unknown_kind_tag_is_rejected() {
    assert_eq!(SignalKind::parse("pcap"), None);
}

#[test]
fn frame_is_namespaced_by_signal_id() {
    let id = SignalId::new("sig-7");
    let frame = signal_frame(&id, "TypeError: boom");
    assert!(frame.starts_with("--- Signal sig-7 ---\n"));
    assert!(frame.contains(&signal_frame_header(&id)));
}
