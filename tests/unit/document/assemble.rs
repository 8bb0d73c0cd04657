use super::*;

fn canvas() -> Canvas {
    Canvas::new(64, 48).unwrap()
}

fn assets(n: usize) -> Vec<ImageAsset> {
    (0..n)
        .map(|i| image_asset(i, canvas(), format!("data:image/png;base64,AAA{i}")))
        .collect()
}

#[test]
fn counts_agree_with_asset_list() {
    let doc = assemble(assets(5), canvas(), FrameRate::new(5.0).unwrap()).unwrap();
    assert_eq!(doc.out_point, 5);
    assert_eq!(doc.assets.len(), 5);
    assert_eq!(doc.layers.len(), 5);
    assert_eq!(doc.in_point, 0);
    assert_eq!((doc.width, doc.height), (64, 48));
    assert_eq!(doc.frame_rate, 5.0);
    assert_eq!(doc.version, LOTTIE_VERSION);
    assert_eq!(doc.name, DEFAULT_DOCUMENT_NAME);
    doc.validate().unwrap();
}

#[test]
fn layer_i_covers_frame_i_and_references_asset_i() {
    let doc = assemble(assets(4), canvas(), FrameRate::new(15.0).unwrap()).unwrap();
    for (i, (layer, asset)) in doc.layers.iter().zip(&doc.assets).enumerate() {
        let i = i as u64;
        assert_eq!(layer.asset_ref, asset.id);
        assert_eq!(layer.index, i + 1);
        assert_eq!(layer.in_point, i);
        assert_eq!(layer.out_point, i + 1);
        assert_eq!(layer.start_time, i);
        assert_eq!(layer.name, format!("frame_{i}"));
        assert_eq!(layer.layer_type, LayerType::Image);
        assert_eq!(layer.blend_mode, BlendMode::Normal);
        assert_eq!(layer.dimensionality, Dimensionality::Flat);
    }
}

#[test]
fn transform_is_static_and_centered() {
    let doc = assemble(assets(1), canvas(), FrameRate::new(15.0).unwrap()).unwrap();
    let ks = &doc.layers[0].transform;
    assert_eq!(ks.opacity.k, 100.0);
    assert_eq!(ks.rotation.k, 0.0);
    assert_eq!(ks.position.k, [32.0, 24.0, 0.0]);
    assert_eq!(ks.anchor.k, [32.0, 24.0, 0.0]);
    assert_eq!(ks.scale.k, [100.0, 100.0, 100.0]);
    assert_eq!(ks.position.animated, 0);
}

#[test]
fn empty_input_fails() {
    let err = assemble(vec![], canvas(), FrameRate::new(15.0).unwrap()).unwrap_err();
    assert!(matches!(err, FlipbookError::EmptyInput(_)));
}

#[test]
fn mismatched_asset_size_fails() {
    let mut list = assets(2);
    list[1].width = 32;
    let err = assemble(list, canvas(), FrameRate::new(15.0).unwrap()).unwrap_err();
    assert!(matches!(err, FlipbookError::Validation(_)));
}

#[test]
fn assembly_is_deterministic() {
    let fr = FrameRate::new(12.0).unwrap();
    let a = assemble(assets(3), canvas(), fr).unwrap();
    let b = assemble(assets(3), canvas(), fr).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn assemble_named_sets_name() {
    let doc = assemble_named(assets(1), canvas(), FrameRate::new(1.0).unwrap(), "clip").unwrap();
    assert_eq!(doc.name, "clip");
}
