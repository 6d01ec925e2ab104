use std::collections::BTreeMap;
use std::path::PathBuf;

use packforge_docker::{
    AccessMode, BuildChunk, Console, ContainerSpec, ImageDetails, VolumeBinding,
};

// ── BuildChunk ──

#[test]
fn error_field_wins_over_stream_text() {
    let chunk = BuildChunk::from_fields(
        Some("Step 3/4\n".to_owned()),
        None,
        None,
        Some("no space left on device".to_owned()),
    );
    assert_eq!(
        chunk,
        Some(BuildChunk::Error("no space left on device".to_owned()))
    );
}

#[test]
fn empty_fields_are_skipped() {
    let chunk = BuildChunk::from_fields(
        Some(String::new()),
        Some("Downloading".to_owned()),
        Some("[==>  ]".to_owned()),
        Some(String::new()),
    );
    assert_eq!(chunk, Some(BuildChunk::Status("Downloading".to_owned())));
    assert_eq!(BuildChunk::from_fields(None, None, None, None), None);
}

// ── ImageDetails ──

#[test]
fn first_tag_is_preferred_over_id() {
    let details = ImageDetails {
        id: Some("sha256:abc".to_owned()),
        tags: vec!["deceptus_engine:latest".to_owned(), "other:1".to_owned()],
    };
    assert_eq!(
        details.reference().unwrap().reference,
        "deceptus_engine:latest"
    );
}

#[test]
fn id_is_used_when_untagged() {
    let details = ImageDetails {
        id: Some("sha256:abc".to_owned()),
        tags: vec![],
    };
    assert_eq!(details.reference().unwrap().to_string(), "sha256:abc");
    assert!(ImageDetails::default().reference().is_none());
}

// ── ContainerSpec ──

#[test]
fn binds_use_docker_syntax() {
    let spec = ContainerSpec {
        image_reference: "img".to_owned(),
        command: vec![],
        environment: BTreeMap::from([
            ("B".to_owned(), "2".to_owned()),
            ("A".to_owned(), "1".to_owned()),
        ]),
        volume_bindings: vec![
            VolumeBinding {
                host_path: PathBuf::from("/repo/build_output"),
                mount_path: "/home/builder/output".to_owned(),
                access: AccessMode::ReadWrite,
            },
            VolumeBinding {
                host_path: PathBuf::from("/repo/docker"),
                mount_path: "/home/builder/tools".to_owned(),
                access: AccessMode::ReadOnly,
            },
        ],
        detached: true,
    };

    assert_eq!(
        spec.binds(),
        vec![
            "/repo/build_output:/home/builder/output:rw".to_owned(),
            "/repo/docker:/home/builder/tools:ro".to_owned(),
        ]
    );
    assert_eq!(spec.env_list(), vec!["A=1".to_owned(), "B=2".to_owned()]);
    assert!(spec.binding_for("/nowhere").is_none());
}

// ── Console ──

#[test]
fn console_adds_missing_newlines_only() {
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let mut console = Console::new(&mut out, &mut err);
    console.line("a");
    console.line("b\n");
    console.error_line("oops");

    assert_eq!(out, b"a\nb\n");
    assert_eq!(err, b"oops\n");
}

#[test]
fn console_forwards_bytes_verbatim() {
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let mut console = Console::new(&mut out, &mut err);
    console.forward(b"ok \xff\n");
    console.forward_error(b"partial");

    assert_eq!(out, b"ok \xff\n");
    assert_eq!(err, b"partial");
}

#[test]
fn console_keeps_characters_split_across_frames() {
    let euro = "\u{20ac}".as_bytes();
    let (mut out, mut err) = (Vec::new(), Vec::new());
    let mut console = Console::new(&mut out, &mut err);
    console.forward(&euro[..2]);
    console.forward(&euro[2..]);
    console.forward_error(&euro[..1]);
    console.forward_error(&euro[1..]);

    assert_eq!(String::from_utf8(out).unwrap(), "\u{20ac}");
    assert_eq!(String::from_utf8(err).unwrap(), "\u{20ac}");
}
