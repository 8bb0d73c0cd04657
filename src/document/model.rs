use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Enums the Lottie schema stores as small integers.
macro_rules! int_code_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u8(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let code = u8::deserialize(deserializer)?;
                Self::from_code(code).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "unsupported {} code {code}",
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

int_code_enum! {
    /// Asset `e` field.
    AssetKind {
        /// Image asset; the data URI in `p` carries the bytes.
        Image = 0,
        /// Image asset explicitly flagged as embedded.
        EmbeddedImage = 1,
    }
}

int_code_enum! {
    /// Layer `ty` field. Only image layers are produced.
    LayerType {
        Image = 2,
    }
}

int_code_enum! {
    /// Layer `bm` field.
    BlendMode {
        Normal = 0,
    }
}

int_code_enum! {
    /// Layer `ddd` field.
    Dimensionality {
        Flat = 0,
    }
}

/// Top-level animation document (`{v, fr, ip, op, w, h, nm, assets, layers}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationDocument {
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "fr", serialize_with = "compact_number")]
    pub frame_rate: f64,
    #[serde(rename = "ip")]
    pub in_point: u64,
    #[serde(rename = "op")]
    pub out_point: u64,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    #[serde(rename = "nm")]
    pub name: String,
    pub assets: Vec<ImageAsset>,
    pub layers: Vec<ImageLayer>,
}

/// Embedded image asset (`{id, w, h, u, p, e}`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: String,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    #[serde(rename = "u")]
    pub uri_prefix: String,
    #[serde(rename = "p")]
    pub data: String,
    #[serde(rename = "e")]
    pub kind: AssetKind,
}

/// Image layer referencing one asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageLayer {
    #[serde(rename = "ddd")]
    pub dimensionality: Dimensionality,
    #[serde(rename = "ind")]
    pub index: u64,
    #[serde(rename = "ty")]
    pub layer_type: LayerType,
    #[serde(rename = "nm")]
    pub name: String,
    #[serde(rename = "refId")]
    pub asset_ref: String,
    #[serde(rename = "ks")]
    pub transform: LayerTransform,
    #[serde(rename = "ip")]
    pub in_point: u64,
    #[serde(rename = "op")]
    pub out_point: u64,
    #[serde(rename = "st")]
    pub start_time: u64,
    #[serde(rename = "bm")]
    pub blend_mode: BlendMode,
}

/// Layer transform (`ks`); every property is static.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerTransform {
    #[serde(rename = "o")]
    pub opacity: StaticProp<f64>,
    #[serde(rename = "r")]
    pub rotation: StaticProp<f64>,
    #[serde(rename = "p")]
    pub position: StaticProp<[f64; 3]>,
    #[serde(rename = "a")]
    pub anchor: StaticProp<[f64; 3]>,
    #[serde(rename = "s")]
    pub scale: StaticProp<[f64; 3]>,
}

impl LayerTransform {
    /// Full opacity, no rotation, 100% scale, anchored and positioned at the canvas center.
    pub fn centered(canvas: Canvas) -> Self {
        let (cx, cy) = canvas.center();
        Self {
            opacity: StaticProp::new(100.0),
            rotation: StaticProp::new(0.0),
            position: StaticProp::new([cx, cy, 0.0]),
            anchor: StaticProp::new([cx, cy, 0.0]),
            scale: StaticProp::new([100.0, 100.0, 100.0]),
        }
    }
}

/// Non-animated property value (`{"a": 0, "k": value}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: CompactNumbers"))]
pub struct StaticProp<T> {
    #[serde(rename = "a")]
    pub animated: u8,
    #[serde(serialize_with = "compact_number")]
    pub k: T,
}

/// Numeric values written the way Lottie exporters write them: integral values without a
/// fraction (`15`, not `15.0`).
pub trait CompactNumbers {
    fn serialize_compact<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;
}

impl CompactNumbers for f64 {
    fn serialize_compact<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = *self;
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
            serializer.serialize_i64(v as i64)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

impl<const N: usize> CompactNumbers for [f64; N] {
    fn serialize_compact<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeTuple as _;

        struct Compact(f64);
        impl Serialize for Compact {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.0.serialize_compact(serializer)
            }
        }

        let mut tuple = serializer.serialize_tuple(N)?;
        for v in self {
            tuple.serialize_element(&Compact(*v))?;
        }
        tuple.end()
    }
}

fn compact_number<T: CompactNumbers, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    value.serialize_compact(serializer)
}

impl<T> StaticProp<T> {
    pub fn new(k: T) -> Self {
        Self { animated: 0, k }
    }
}

impl AnimationDocument {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.out_point.saturating_sub(self.in_point)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.frame_count() as f64 / self.frame_rate
        } else {
            0.0
        }
    }

    /// Check the flipbook invariants: counts agree, references resolve to exactly one asset,
    /// sizes match the canvas, and layer `i` covers exactly frame `i`.
    pub fn validate(&self) -> FlipbookResult<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(FlipbookError::validation("document frame rate must be > 0"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(FlipbookError::validation("document width/height must be > 0"));
        }
        if self.in_point != 0 {
            return Err(FlipbookError::validation("document in point must be 0"));
        }
        if self.assets.is_empty() {
            return Err(FlipbookError::empty_input("document has no assets"));
        }
        let n = self.assets.len() as u64;
        if self.layers.len() as u64 != n || self.out_point != n {
            return Err(FlipbookError::validation(format!(
                "document counts disagree: {} assets, {} layers, out point {}",
                self.assets.len(),
                self.layers.len(),
                self.out_point
            )));
        }

        let mut ids: HashMap<&str, usize> = HashMap::with_capacity(self.assets.len());
        for asset in &self.assets {
            if asset.width != self.width || asset.height != self.height {
                return Err(FlipbookError::validation(format!(
                    "asset '{}' is {}x{}, document is {}x{}",
                    asset.id, asset.width, asset.height, self.width, self.height
                )));
            }
            *ids.entry(asset.id.as_str()).or_default() += 1;
        }

        for (i, layer) in self.layers.iter().enumerate() {
            let i = i as u64;
            match ids.get(layer.asset_ref.as_str()) {
                Some(1) => {}
                Some(_) => {
                    return Err(FlipbookError::validation(format!(
                        "layer {} references ambiguous asset id '{}'",
                        layer.index, layer.asset_ref
                    )));
                }
                None => {
                    return Err(FlipbookError::validation(format!(
                        "layer {} references missing asset '{}'",
                        layer.index, layer.asset_ref
                    )));
                }
            }
            if layer.index != i + 1
                || layer.in_point != i
                || layer.out_point != i + 1
                || layer.start_time != i
            {
                return Err(FlipbookError::validation(format!(
                    "layer {} timing does not match position {i}",
                    layer.index
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
