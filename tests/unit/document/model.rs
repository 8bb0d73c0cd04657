use super::*;
use crate::document::assemble::{assemble, image_asset};
use crate::foundation::core::FrameRate;

fn doc(n: usize) -> AnimationDocument {
    let canvas = Canvas::new(4, 2).unwrap();
    let assets = (0..n)
        .map(|i| image_asset(i, canvas, "data:image/png;base64,AA==".to_string()))
        .collect();
    assemble(assets, canvas, FrameRate::new(5.0).unwrap()).unwrap()
}

#[test]
fn serializes_schema_field_names() {
    let v = serde_json::to_value(doc(1)).unwrap();
    for key in ["v", "fr", "ip", "op", "w", "h", "nm", "assets", "layers"] {
        assert!(v.get(key).is_some(), "missing top-level key {key}");
    }
    let asset = &v["assets"][0];
    assert_eq!(asset["id"], "img_0");
    assert_eq!(asset["u"], "");
    assert_eq!(asset["e"], 0);
    assert_eq!(asset["w"], 4);

    let layer = &v["layers"][0];
    assert_eq!(layer["ddd"], 0);
    assert_eq!(layer["ind"], 1);
    assert_eq!(layer["ty"], 2);
    assert_eq!(layer["refId"], "img_0");
    assert_eq!(layer["bm"], 0);
    assert_eq!(layer["ks"]["o"]["a"], 0);
    assert_eq!(layer["ks"]["p"]["k"][0], 2.0);
}

#[test]
fn json_roundtrip_is_field_for_field() {
    let d = doc(3);
    let s = serde_json::to_string(&d).unwrap();
    let back: AnimationDocument = serde_json::from_str(&s).unwrap();
    assert_eq!(back, d);
}

#[test]
fn unknown_codes_are_rejected() {
    assert!(serde_json::from_str::<LayerType>("4").is_err());
    assert!(serde_json::from_str::<BlendMode>("3").is_err());
    assert_eq!(serde_json::from_str::<AssetKind>("1").unwrap(), AssetKind::EmbeddedImage);
    assert_eq!(LayerType::from_code(2), Some(LayerType::Image));
}

#[test]
fn validate_accepts_assembled_documents() {
    doc(4).validate().unwrap();
}

#[test]
fn validate_rejects_count_mismatch() {
    let mut d = doc(3);
    d.out_point = 2;
    assert!(d.validate().is_err());

    let mut d = doc(3);
    d.layers.pop();
    assert!(d.validate().is_err());
}

#[test]
fn validate_rejects_dangling_and_duplicate_refs() {
    let mut d = doc(2);
    d.layers[1].asset_ref = "img_9".to_string();
    assert!(d.validate().is_err());

    let mut d = doc(2);
    d.assets[1].id = "img_0".to_string();
    d.layers[1].asset_ref = "img_0".to_string();
    assert!(d.validate().is_err());
}

#[test]
fn validate_rejects_shifted_timing() {
    let mut d = doc(2);
    d.layers[1].in_point = 0;
    assert!(d.validate().is_err());
}

#[test]
fn validate_rejects_empty_document() {
    let mut d = doc(1);
    d.assets.clear();
    d.layers.clear();
    d.out_point = 0;
    assert!(matches!(d.validate(), Err(FlipbookError::EmptyInput(_))));
}

#[test]
fn duration_follows_frame_rate() {
    let d = doc(10);
    assert_eq!(d.frame_count(), 10);
    assert_eq!(d.duration_secs(), 2.0);
}
