mod common;

use common::{assert_close, block_room_json, size};
use crowd_sim::adapters::inbound::FilesystemLayoutSource;
use crowd_sim::domains::geometry::Point;
use crowd_sim::domains::obstacles::{LayoutDocument, LayoutSource, ObstacleKind, ObstacleLayout};
use crowd_sim::DomainError;
use std::fs;
use tempfile::tempdir;

fn layout_from(json: &str) -> Result<ObstacleLayout, DomainError> {
    let document = LayoutDocument::from_json(json)?;
    ObstacleLayout::from_document(&document, size(10.0, 10.0), 1.0, "test.json")
}

#[test]
fn fractions_are_scaled_and_zero_exit_size_becomes_one_unit() {
    let layout = layout_from(block_room_json()).unwrap();

    let block = layout.get("block").unwrap();
    assert_close(block.begin(), Point::new(4.0, 4.0));
    assert_close(block.end(), Point::new(6.0, 6.0));

    let exit = layout.exit();
    assert_eq!(exit.kind(), ObstacleKind::Exit);
    assert_close(exit.begin(), Point::new(9.0, 4.5));
    assert_close(exit.end(), Point::new(10.0, 5.5));
    assert_eq!(layout.obstacles().len(), 2);
}

#[test]
fn missing_exit_is_rejected() {
    let err = layout_from(r#"{ "obstacles": [ { "name": "a", "begin": [0.1, 0.1], "size": [0.1, 0.1] } ] }"#)
        .unwrap_err();
    assert!(matches!(err, DomainError::MissingExit { ref source_name } if source_name == "test.json"));
}

#[test]
fn several_exits_are_rejected() {
    let err = layout_from(
        r#"{ "exits": [
            { "name": "east", "begin": [0.9, 0.5], "size": [0.1, 0.1] },
            { "name": "west", "begin": [0.0, 0.5], "size": [0.1, 0.1] }
        ] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::MultipleExits { count: 2, .. }));
}

#[test]
fn duplicate_names_are_rejected() {
    let err = layout_from(
        r#"{
            "obstacles": [
                { "name": "wall", "begin": [0.1, 0.1], "size": [0.1, 0.1] },
                { "name": "wall", "begin": [0.5, 0.5], "size": [0.1, 0.1] }
            ],
            "exits": [ { "name": "exit", "begin": [0.9, 0.5], "size": [0.1, 0.1] } ]
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::InvalidLayout { .. }));
}

#[test]
fn begin_outside_the_domain_is_rejected() {
    let err = layout_from(
        r#"{
            "obstacles": [ { "name": "far", "begin": [1.5, 0.1], "size": [0.1, 0.1] } ],
            "exits": [ { "name": "exit", "begin": [0.9, 0.5], "size": [0.1, 0.1] } ]
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, DomainError::InvalidLayout { .. }));
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let err = layout_from("{ not json").unwrap_err();
    assert!(matches!(err, DomainError::SerializationError(_)));
}

#[test]
fn entrances_are_kept_apart_from_obstacles() {
    let layout = layout_from(
        r#"{
            "exits": [ { "name": "exit", "begin": [0.9, 0.5], "size": [0.1, 0.1] } ],
            "entrances": [ { "name": "door", "begin": [0.0, 0.5], "size": [0.05, 0.1], "spawn_rate": 2.0 } ]
        }"#,
    )
    .unwrap();
    assert_eq!(layout.obstacles().len(), 1);
    assert_eq!(layout.entrances().len(), 1);
    let door = &layout.entrances()[0];
    assert_eq!(door.kind(), ObstacleKind::Entrance);
    assert_eq!(door.spawn_rate(), 2.0);
    assert!(layout.get("door").is_none());
}

#[test]
fn exit_is_permeable_once_walking() {
    let layout = layout_from(block_room_json()).unwrap();
    let inside_exit = Point::new(9.5, 5.0);
    assert!(!layout.is_accessible(&inside_exit, true));
    assert!(layout.is_accessible(&inside_exit, false));
    assert!(!layout.is_accessible(&Point::new(5.0, 5.0), false));
    assert!(!layout.is_accessible(&Point::new(0.0, 5.0), false));
    assert!(layout.is_accessible(&Point::new(1.0, 5.0), true));
}

#[test]
fn filesystem_source_reads_layout_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("room.json"), block_room_json()).unwrap();
    let source = FilesystemLayoutSource::new(Some(dir.path().to_path_buf()));

    let document = source.load_layout("room.json").unwrap();
    assert_eq!(document.obstacles.len(), 1);
    assert_eq!(document.exits.len(), 1);
    assert!(document.entrances.is_empty());
}

#[test]
fn filesystem_source_reports_missing_files() {
    let dir = tempdir().unwrap();
    let source = FilesystemLayoutSource::new(Some(dir.path().to_path_buf()));
    let err = source.load_layout("absent.json").unwrap_err();
    assert!(matches!(err, DomainError::InfrastructureError(_)));
}
