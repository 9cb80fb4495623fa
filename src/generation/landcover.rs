//! Land-cover classes and the column stacks they produce

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::WATER_CODE;
use crate::core::Result;
use crate::voxel::{BlockColumn, LayerSpec, Material};

/// One land-cover class
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandcoverClass {
    pub name: String,
    /// Column stack below the surface, top to bottom
    pub layers: LayerSpec,
}

/// Maps land-cover codes to column stacks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandcoverTable {
    /// Code treated as open water
    #[serde(default = "default_water_code")]
    pub water_code: u8,
    /// Stack for codes missing from `classes`
    pub fallback: LayerSpec,
    pub classes: BTreeMap<u8, LandcoverClass>,
}

fn default_water_code() -> u8 {
    WATER_CODE
}

/// National Land Cover Database classes
const NLCD: [(u8, &str, &str); 20] = [
    (11, "Open Water", "Sand:2, Gravel:1, Stone"),
    (12, "Perennial Ice/Snow", "Snow:1, Ice:2, Stone"),
    (21, "Developed, Open Space", "Grass:1, Dirt:2, Stone"),
    (22, "Developed, Low Intensity", "Cobblestone:1, Dirt:1, Stone"),
    (23, "Developed, Medium Intensity", "Cobblestone:2, Stone"),
    (24, "Developed, High Intensity", "Cobblestone:3, Stone"),
    (31, "Barren Land", "Sand:2, Gravel:2, Stone"),
    (32, "Unconsolidated Shore", "Sand:3, Sandstone:2, Stone"),
    (41, "Deciduous Forest", "Grass:1, Dirt:3, Stone"),
    (42, "Evergreen Forest", "Grass:1, Dirt:3, Stone"),
    (43, "Mixed Forest", "Grass:1, Dirt:3, Stone"),
    (51, "Dwarf Scrub", "Grass:1, Dirt:1, Stone"),
    (52, "Shrub/Scrub", "Grass:1, Dirt:2, Stone"),
    (71, "Grassland/Herbaceous", "Grass:1, Dirt:2, Stone"),
    (72, "Sedge/Herbaceous", "Grass:1, Dirt:2, Stone"),
    (73, "Lichens", "Grass:1, Gravel:1, Stone"),
    (81, "Pasture/Hay", "Grass:1, Dirt:3, Stone"),
    (82, "Cultivated Crops", "Farmland:1, Dirt:3, Stone"),
    (90, "Woody Wetlands", "Grass:1, Clay:2, Dirt:1, Stone"),
    (95, "Emergent Herbaceous Wetlands", "Grass:1, Clay:2, Stone"),
];

impl Default for LandcoverTable {
    fn default() -> Self {
        let mut classes = BTreeMap::new();
        for (code, name, layers) in NLCD {
            if let Ok(layers) = layers.parse() {
                classes.insert(
                    code,
                    LandcoverClass {
                        name: name.to_string(),
                        layers,
                    },
                );
            }
        }
        Self {
            water_code: WATER_CODE,
            fallback: LayerSpec::solid(Material::STONE)
                .with_top(2, Material::DIRT)
                .with_top(1, Material::GRASS),
            classes,
        }
    }
}

impl LandcoverTable {
    /// Load a table from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let table: LandcoverTable = serde_json::from_str(&text)?;
        log::info!("Loaded {} land-cover classes from {}", table.classes.len(), path.display());
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Column stack for a code
    pub fn layers(&self, code: u8) -> &LayerSpec {
        self.classes
            .get(&code)
            .map(|c| &c.layers)
            .unwrap_or(&self.fallback)
    }

    pub fn is_water(&self, code: u8) -> bool {
        code == self.water_code
    }

    /// Build the column for one output cell.
    ///
    /// Water cells carry `depth` blocks of water above their class stack, so
    /// the water surface sits at the interpolated elevation.
    pub fn column(&self, x: i32, z: i32, code: u8, elevation: i32, depth: u32) -> BlockColumn {
        let layers = self.layers(code);
        let layers = if self.is_water(code) && depth > 0 {
            layers.with_top(depth, Material::WATER)
        } else {
            layers.clone()
        };
        BlockColumn::new(x, z, elevation, layers)
    }
}
