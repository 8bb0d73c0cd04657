use super::*;
use crate::document::assemble::{assemble, image_asset};
use crate::foundation::core::{Canvas, FrameRate};
use crate::foundation::error::FlipbookError;

fn sample_doc(frames: usize) -> AnimationDocument {
    let canvas = Canvas::new(32, 24).unwrap();
    let assets = (0..frames)
        .map(|i| image_asset(i, canvas, format!("data:image/png;base64,AAAA{i}")))
        .collect();
    assemble(assets, canvas, FrameRate::new(12.0).unwrap()).unwrap()
}

#[test]
fn compact_form_round_trips() {
    let doc = sample_doc(3);
    let text = serialize(&doc).unwrap();
    assert_eq!(parse(&text).unwrap(), doc);
    assert_eq!(serialize(&parse(&text).unwrap()).unwrap(), text);
}

#[test]
fn compact_form_has_no_whitespace_and_schema_order() {
    let text = serialize(&sample_doc(1)).unwrap();
    assert!(!text.contains('\n'));
    assert!(!text.contains(": "));
    assert!(text.starts_with(r#"{"v":"5.7.1","fr":12,"ip":0,"op":1,"w":32,"h":24,"#));
}

#[test]
fn integral_numbers_are_written_without_fraction() {
    let text = serialize(&sample_doc(1)).unwrap();
    assert!(text.contains(r#""o":{"a":0,"k":100}"#));
    assert!(text.contains(r#""p":{"a":0,"k":[16,12,0]}"#));
    assert!(text.contains(r#""s":{"a":0,"k":[100,100,100]}"#));
    assert!(!text.contains(".0,") && !text.contains(".0]") && !text.contains(".0}"));

    let canvas = Canvas::new(5, 3).unwrap();
    let doc = assemble(
        vec![image_asset(0, canvas, "data:image/png;base64,AAAA".to_string())],
        canvas,
        FrameRate::new(12.5).unwrap(),
    )
    .unwrap();
    let text = serialize(&doc).unwrap();
    assert!(text.contains(r#""fr":12.5,"#));
    assert!(text.contains(r#""k":[2.5,1.5,0]"#));
    assert_eq!(parse(&text).unwrap(), doc);
}

#[test]
fn pretty_form_parses_to_same_document() {
    let doc = sample_doc(2);
    let pretty = serialize_pretty(&doc).unwrap();
    assert!(pretty.contains('\n'));
    assert_eq!(parse(&pretty).unwrap(), doc);
}

#[test]
fn compression_ratio_measures_savings() {
    assert_eq!(compression_ratio("", ""), 0.0);
    assert_eq!(compression_ratio("abcd", "ab"), 50.0);
    assert_eq!(compression_ratio("abcd", "abcd"), 0.0);

    let doc = sample_doc(2);
    let ratio = compression_ratio(
        &serialize_pretty(&doc).unwrap(),
        &serialize(&doc).unwrap(),
    );
    assert!(ratio > 0.0 && ratio < 100.0);
}

#[test]
fn parse_rejects_malformed_text() {
    assert!(matches!(parse("{\"v\":"), Err(FlipbookError::Serde(_))));
}

#[test]
fn filenames_carry_the_timestamp() {
    assert_eq!(suggested_filename(1_700_000_000_123), "animation_1700000000123.json");
    let name = timestamped_filename();
    assert!(name.starts_with("animation_") && name.ends_with(".json"));
    assert_ne!(name, "animation_0.json");
}
