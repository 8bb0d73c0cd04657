use crate::document::model::{
    AnimationDocument, AssetKind, BlendMode, Dimensionality, ImageAsset, ImageLayer, LayerTransform,
    LayerType,
};
use crate::foundation::core::{Canvas, FrameRate};
use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Schema version written into `v`.
pub const LOTTIE_VERSION: &str = "5.7.1";
/// Default document name (`nm`).
pub const DEFAULT_DOCUMENT_NAME: &str = "Video Frame Sequence";

pub fn asset_id(index: usize) -> String {
    format!("img_{index}")
}

pub fn layer_name(index: usize) -> String {
    format!("frame_{index}")
}

/// Asset for the frame at `index`, sized to the canvas.
pub fn image_asset(index: usize, canvas: Canvas, data: String) -> ImageAsset {
    ImageAsset {
        id: asset_id(index),
        width: canvas.width,
        height: canvas.height,
        uri_prefix: String::new(),
        data,
        kind: AssetKind::Image,
    }
}

/// Build the flipbook document: one image layer per asset, each visible for exactly one frame.
pub fn assemble(
    assets: Vec<ImageAsset>,
    canvas: Canvas,
    frame_rate: FrameRate,
) -> FlipbookResult<AnimationDocument> {
    assemble_named(assets, canvas, frame_rate, DEFAULT_DOCUMENT_NAME)
}

/// [`assemble`] with an explicit document name.
#[tracing::instrument(skip(assets), fields(frames = assets.len()))]
pub fn assemble_named(
    assets: Vec<ImageAsset>,
    canvas: Canvas,
    frame_rate: FrameRate,
    name: &str,
) -> FlipbookResult<AnimationDocument> {
    if assets.is_empty() {
        return Err(FlipbookError::empty_input("no frames to assemble"));
    }
    let canvas = Canvas::new(canvas.width, canvas.height)?;
    if let Some(bad) = assets
        .iter()
        .find(|a| a.width != canvas.width || a.height != canvas.height)
    {
        return Err(FlipbookError::validation(format!(
            "asset '{}' is {}x{}, canvas is {}x{}",
            bad.id, bad.width, bad.height, canvas.width, canvas.height
        )));
    }

    let transform = LayerTransform::centered(canvas);
    let layers = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| image_layer(i, asset, transform.clone()))
        .collect();

    Ok(AnimationDocument {
        version: LOTTIE_VERSION.to_string(),
        frame_rate: frame_rate.as_f64(),
        in_point: 0,
        out_point: assets.len() as u64,
        width: canvas.width,
        height: canvas.height,
        name: name.to_string(),
        assets,
        layers,
    })
}

fn image_layer(i: usize, asset: &ImageAsset, transform: LayerTransform) -> ImageLayer {
    let frame = i as u64;
    ImageLayer {
        dimensionality: Dimensionality::Flat,
        index: frame + 1,
        layer_type: LayerType::Image,
        name: layer_name(i),
        asset_ref: asset.id.clone(),
        transform,
        in_point: frame,
        out_point: frame + 1,
        start_time: frame,
        blend_mode: BlendMode::Normal,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/assemble.rs"]
mod tests;
