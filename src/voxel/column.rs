//! Column layer specifications
//!
//! A column is described top to bottom as a list of exact-thickness layers
//! followed by one layer that fills whatever height remains down to zero.

use serde::{Deserialize, Serialize};

use super::material::Material;
use crate::core::{Error, Result};

/// One segment of a column, top to bottom
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    /// A run of exactly `thickness` blocks
    Exact { thickness: u32, material: Material },
    /// Everything below the previous segments
    FillRemainder(Material),
}

impl Layer {
    pub fn material(&self) -> Material {
        match self {
            Layer::Exact { material, .. } => *material,
            Layer::FillRemainder(material) => *material,
        }
    }
}

/// Ordered layer list ending in exactly one [`Layer::FillRemainder`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerSpec {
    layers: Vec<Layer>,
}

impl LayerSpec {
    /// Validate and wrap a layer list
    pub fn new(layers: Vec<Layer>) -> Result<Self> {
        let Some((last, rest)) = layers.split_last() else {
            return Err(Error::LayerSpec("empty layer list".into()));
        };
        if !matches!(last, Layer::FillRemainder(_)) {
            return Err(Error::LayerSpec(
                "last layer must fill the remainder".into(),
            ));
        }
        if rest.iter().any(|l| matches!(l, Layer::FillRemainder(_))) {
            return Err(Error::LayerSpec(
                "only the last layer may fill the remainder".into(),
            ));
        }
        Ok(Self { layers })
    }

    /// A single material all the way down
    pub fn solid(material: Material) -> Self {
        Self {
            layers: vec![Layer::FillRemainder(material)],
        }
    }

    /// Put `thickness` blocks of `material` on top of this stack
    pub fn with_top(&self, thickness: u32, material: Material) -> Self {
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        if thickness > 0 {
            layers.push(Layer::Exact {
                thickness,
                material,
            });
        }
        layers.extend_from_slice(&self.layers);
        Self { layers }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Topmost material of the column
    pub fn surface(&self) -> Material {
        self.layers
            .iter()
            .find(|l| !matches!(l, Layer::Exact { thickness: 0, .. }))
            .unwrap_or(&self.layers[self.layers.len() - 1])
            .material()
    }

    /// Resolve the layers into `(bottom, top, material)` runs for a column
    /// whose highest block sits at `top - 1`. Runs are half-open and never
    /// extend below zero.
    pub fn runs(&self, top: u32) -> Vec<(u32, u32, Material)> {
        let mut runs = Vec::with_capacity(self.layers.len());
        let mut cursor = top;
        for layer in &self.layers {
            if cursor == 0 {
                break;
            }
            let thickness = match layer {
                Layer::Exact { thickness, .. } => (*thickness).min(cursor),
                Layer::FillRemainder(_) => cursor,
            };
            if thickness > 0 {
                runs.push((cursor - thickness, cursor, layer.material()));
                cursor -= thickness;
            }
        }
        runs
    }
}

impl std::str::FromStr for LayerSpec {
    type Err = Error;

    /// Parses `"Water:2, Sand:1, Stone"`
    fn from_str(s: &str) -> Result<Self> {
        let mut layers = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(Error::LayerSpec(format!("empty segment in '{}'", s)));
            }
            match part.rsplit_once(':') {
                Some((name, thickness)) => {
                    let thickness = thickness.trim().parse::<u32>().map_err(|_| {
                        Error::LayerSpec(format!("bad thickness in '{}'", part))
                    })?;
                    layers.push(Layer::Exact {
                        thickness,
                        material: name.parse()?,
                    });
                }
                None => layers.push(Layer::FillRemainder(part.parse()?)),
            }
        }
        LayerSpec::new(layers)
    }
}

impl std::fmt::Display for LayerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match layer {
                Layer::Exact {
                    thickness,
                    material,
                } => write!(f, "{}:{}", material, thickness)?,
                Layer::FillRemainder(material) => write!(f, "{}", material)?,
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for LayerSpec {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LayerSpec> for String {
    fn from(spec: LayerSpec) -> String {
        spec.to_string()
    }
}

/// Everything needed to write one world column
#[derive(Clone, Debug, PartialEq)]
pub struct BlockColumn {
    pub x: i32,
    pub z: i32,
    /// Surface elevation relative to sea level
    pub elevation: i32,
    pub layers: LayerSpec,
}

impl BlockColumn {
    pub fn new(x: i32, z: i32, elevation: i32, layers: LayerSpec) -> Self {
        Self {
            x,
            z,
            elevation,
            layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let spec: LayerSpec = "Water:2, Sand:1, Stone".parse().unwrap();
        assert_eq!(
            spec.layers(),
            &[
                Layer::Exact {
                    thickness: 2,
                    material: Material::WATER
                },
                Layer::Exact {
                    thickness: 1,
                    material: Material::SAND
                },
                Layer::FillRemainder(Material::STONE),
            ]
        );
        assert_eq!(spec.to_string(), "water:2, sand:1, stone");
    }

    #[test]
    fn test_rejects_missing_remainder() {
        assert!("Water:2".parse::<LayerSpec>().is_err());
        assert!("Stone, Dirt".parse::<LayerSpec>().is_err());
        assert!("".parse::<LayerSpec>().is_err());
        assert!(LayerSpec::new(vec![]).is_err());
    }

    #[test]
    fn test_runs_cover_column() {
        let spec: LayerSpec = "Water:2, Sand:1, Stone".parse().unwrap();
        let runs = spec.runs(64);
        assert_eq!(
            runs,
            vec![
                (62, 64, Material::WATER),
                (61, 62, Material::SAND),
                (0, 61, Material::STONE),
            ]
        );
    }

    #[test]
    fn test_runs_clip_at_zero() {
        let spec: LayerSpec = "Water:5, Stone".parse().unwrap();
        assert_eq!(spec.runs(3), vec![(0, 3, Material::WATER)]);
        assert!(spec.runs(0).is_empty());
    }

    #[test]
    fn test_with_top_and_surface() {
        let base = LayerSpec::solid(Material::DIRT);
        let spec = base.with_top(3, Material::WATER);
        assert_eq!(spec.surface(), Material::WATER);
        assert_eq!(base.with_top(0, Material::WATER), base);
        assert_eq!(base.surface(), Material::DIRT);
    }

    #[test]
    fn test_serde_as_string() {
        let spec: LayerSpec = "Grass:1, Dirt:2, Stone".parse().unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, "\"grass:1, dirt:2, stone\"");
        let back: LayerSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
