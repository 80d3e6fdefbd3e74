//! Coarse land-cover taxonomy.
//!
//! GLC_FCS30D publishes 34 fine-grained codes (10..=220). They are collapsed
//! into ten coarse classes; the class list also fixes the composition columns
//! of every output row.
use serde::{Deserialize, Serialize};

use crate::error::{LandfragError, Result};

/// One of the ten coarse land-cover classes. Discriminants are the class ids
/// written into the remapped raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CoarseClass {
    Cropland = 1,
    Forest = 2,
    Shrubland = 3,
    Grassland = 4,
    SparseVegetation = 5,
    Wetland = 6,
    Impervious = 7,
    Barren = 8,
    Water = 9,
    SnowIce = 10,
}

/// Number of coarse classes.
pub const N_CLASSES: usize = 10;

impl CoarseClass {
    /// All classes in id order.
    pub const ALL: [CoarseClass; N_CLASSES] = [
        CoarseClass::Cropland,
        CoarseClass::Forest,
        CoarseClass::Shrubland,
        CoarseClass::Grassland,
        CoarseClass::SparseVegetation,
        CoarseClass::Wetland,
        CoarseClass::Impervious,
        CoarseClass::Barren,
        CoarseClass::Water,
        CoarseClass::SnowIce,
    ];

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Position of the class in [`CoarseClass::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1..=10 => Some(Self::ALL[id as usize - 1]),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CoarseClass::Cropland => "Arable land/Crops",
            CoarseClass::Forest => "Forest",
            CoarseClass::Shrubland => "Shrubland",
            CoarseClass::Grassland => "Grassland/Pasture",
            CoarseClass::SparseVegetation => "Sparse Vegetation",
            CoarseClass::Wetland => "Wetlands",
            CoarseClass::Impervious => "Impervious Surfaces (Urban)",
            CoarseClass::Barren => "Barren",
            CoarseClass::Water => "Water",
            CoarseClass::SnowIce => "Snow/Ice",
        }
    }
}

/// Number of fine codes with a coarse mapping.
pub const N_FINE_CODES: usize = 34;

/// Fine GLC_FCS30D code → coarse class. See https://zenodo.org/records/8239305
/// for the fine legend.
const FINE_CODES: [(u16, CoarseClass); N_FINE_CODES] = [
    (10, CoarseClass::Cropland),
    (11, CoarseClass::Cropland),
    (12, CoarseClass::Cropland),
    (20, CoarseClass::Cropland),
    (51, CoarseClass::Forest),
    (52, CoarseClass::Forest),
    (61, CoarseClass::Forest),
    (62, CoarseClass::Forest),
    (71, CoarseClass::Forest),
    (72, CoarseClass::Forest),
    (81, CoarseClass::Forest),
    (82, CoarseClass::Forest),
    (91, CoarseClass::Forest),
    (92, CoarseClass::Forest),
    (120, CoarseClass::Shrubland),
    (121, CoarseClass::Shrubland),
    (122, CoarseClass::Shrubland),
    (130, CoarseClass::Grassland),
    (150, CoarseClass::SparseVegetation),
    (152, CoarseClass::SparseVegetation),
    (153, CoarseClass::SparseVegetation),
    (181, CoarseClass::Wetland),
    (182, CoarseClass::Wetland),
    (183, CoarseClass::Wetland),
    (184, CoarseClass::Wetland),
    (185, CoarseClass::Wetland),
    (186, CoarseClass::Wetland),
    (187, CoarseClass::Wetland),
    (190, CoarseClass::Impervious),
    (200, CoarseClass::Barren),
    (201, CoarseClass::Barren),
    (202, CoarseClass::Barren),
    (210, CoarseClass::Water),
    (220, CoarseClass::SnowIce),
];

/// Map a fine land-cover code to its coarse class.
pub fn coarse_class_of(fine: u16) -> Result<CoarseClass> {
    FINE_CODES
        .iter()
        .find(|(code, _)| *code == fine)
        .map(|&(_, class)| class)
        .ok_or(LandfragError::UnmappedCode(fine))
}

/// Class names in id order; defines the composition columns of the output.
pub fn all_class_names() -> [&'static str; N_CLASSES] {
    CoarseClass::ALL.map(CoarseClass::name)
}

/// Parallel `(from, to)` lists for a server-side remap. Pixels whose code is
/// absent from `from` are masked by the remap, so unmapped codes drop out.
pub fn remap_table() -> (Vec<u16>, Vec<u8>) {
    FINE_CODES.iter().map(|&(code, class)| (code, class.id())).unzip()
}
