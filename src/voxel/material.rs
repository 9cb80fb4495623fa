//! Block materials: a block id plus an auxiliary data byte

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Block type written into a chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Material {
    /// Block id stored in the block array
    pub id: u8,
    /// Value stored in the auxiliary data array
    pub data: u8,
}

impl Material {
    pub const AIR: Material = Material::new(0, 0);
    pub const STONE: Material = Material::new(1, 0);
    pub const GRASS: Material = Material::new(2, 0);
    pub const DIRT: Material = Material::new(3, 0);
    pub const COBBLESTONE: Material = Material::new(4, 0);
    pub const BEDROCK: Material = Material::new(7, 0);
    pub const WATER: Material = Material::new(9, 0);
    pub const SAND: Material = Material::new(12, 0);
    pub const GRAVEL: Material = Material::new(13, 0);
    pub const LOG: Material = Material::new(17, 0);
    pub const LEAVES: Material = Material::new(18, 0);
    pub const SANDSTONE: Material = Material::new(24, 0);
    pub const FARMLAND: Material = Material::new(60, 0);
    pub const ICE: Material = Material::new(79, 0);
    pub const SNOW: Material = Material::new(80, 0);
    pub const CLAY: Material = Material::new(82, 0);

    pub const fn new(id: u8, data: u8) -> Self {
        Self { id, data }
    }

    /// Look up a material by name (case-insensitive, spaces or underscores)
    pub fn named(name: &str) -> Result<Material> {
        let key = name.trim().to_ascii_lowercase().replace(' ', "_");
        NAMED
            .iter()
            .find(|(n, _)| *n == key)
            .map(|(_, m)| *m)
            .ok_or_else(|| Error::LayerSpec(format!("unknown material '{}'", name)))
    }

    /// Canonical name, if this is a named material
    pub fn name(&self) -> Option<&'static str> {
        NAMED.iter().find(|(_, m)| m == self).map(|(n, _)| *n)
    }
}

const NAMED: [(&str, Material); 16] = [
    ("air", Material::AIR),
    ("stone", Material::STONE),
    ("grass", Material::GRASS),
    ("dirt", Material::DIRT),
    ("cobblestone", Material::COBBLESTONE),
    ("bedrock", Material::BEDROCK),
    ("water", Material::WATER),
    ("sand", Material::SAND),
    ("gravel", Material::GRAVEL),
    ("log", Material::LOG),
    ("leaves", Material::LEAVES),
    ("sandstone", Material::SANDSTONE),
    ("farmland", Material::FARMLAND),
    ("ice", Material::ICE),
    ("snow", Material::SNOW),
    ("clay", Material::CLAY),
];

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}/{}", self.id, self.data),
        }
    }
}

impl std::str::FromStr for Material {
    type Err = Error;

    /// Accepts a name ("sand") or a raw "id/data" pair ("35/14")
    fn from_str(s: &str) -> Result<Material> {
        if let Some((id, data)) = s.trim().split_once('/') {
            let parse = |v: &str| {
                v.trim()
                    .parse::<u8>()
                    .map_err(|_| Error::LayerSpec(format!("bad material '{}'", s)))
            };
            return Ok(Material::new(parse(id)?, parse(data)?));
        }
        Material::named(s)
    }
}

impl TryFrom<String> for Material {
    type Error = Error;

    fn try_from(s: String) -> Result<Material> {
        s.parse()
    }
}

impl From<Material> for String {
    fn from(m: Material) -> String {
        m.to_string()
    }
}
