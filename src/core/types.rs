//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Index of a node in a [`ForceTree`](crate::force::ForceTree) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an officer record in a [`ForceTree`](crate::force::ForceTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfficerId(pub u32);

// ============================================================================
// Echelons
// ============================================================================

pub const ECHELON_ELEMENT: u8 = 0;
pub const ECHELON_SQUAD: u8 = 1;
pub const ECHELON_LANCE: u8 = 3;
pub const ECHELON_COMPANY: u8 = 4;
pub const ECHELON_BATTALION: u8 = 5;
pub const ECHELON_REGIMENT: u8 = 6;

/// Generic echelon names for ground forces, indexed by echelon
pub const GROUND_ECHELON_NAMES: [&str; 11] = [
    "Element", "Squad", "(2)", "Lance", "Company", "Battalion", "Regiment", "Brigade",
    "Division", "Corps", "Army",
];

/// Generic echelon names for aerospace forces, indexed by echelon
pub const AIR_ECHELON_NAMES: [&str; 8] = [
    "Element", "(1)", "(2)", "Flight", "Squadron", "Group", "Wing", "Regiment",
];

// ============================================================================
// Weight class
// ============================================================================

/// Canonical ordered weight classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeightClass {
    UltraLight,
    Light,
    Medium,
    Heavy,
    Assault,
    Colossal,
}

/// Substitution order tried when a weight class cannot be filled.
/// Row = requested class, columns = replacement tried at each ladder step.
const ALTERNATE_WEIGHTS: [[usize; 5]; 6] = [
    [1, 2, 3, 4, 5], // UL
    [2, 0, 3, 4, 5], // L
    [3, 1, 4, 0, 5], // M
    [2, 4, 1, 5, 0], // H
    [3, 2, 5, 1, 0], // A
    [4, 3, 2, 1, 0], // SH
];

impl WeightClass {
    pub const ALL: [WeightClass; 6] = [
        WeightClass::UltraLight,
        WeightClass::Light,
        WeightClass::Medium,
        WeightClass::Heavy,
        WeightClass::Assault,
        WeightClass::Colossal,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Replacement for this class at the given ladder step (0..5)
    pub fn alternate(self, step: usize) -> Option<Self> {
        ALTERNATE_WEIGHTS[self.index()]
            .get(step)
            .and_then(|&i| Self::from_index(i))
    }

    pub fn code(self) -> &'static str {
        match self {
            WeightClass::UltraLight => "UL",
            WeightClass::Light => "L",
            WeightClass::Medium => "M",
            WeightClass::Heavy => "H",
            WeightClass::Assault => "A",
            WeightClass::Colossal => "SH",
        }
    }

    /// Parse a weight class code. `C` is accepted as an alias for colossal.
    pub fn decode(code: &str) -> Option<Self> {
        match code {
            "UL" => Some(WeightClass::UltraLight),
            "L" => Some(WeightClass::Light),
            "M" => Some(WeightClass::Medium),
            "H" => Some(WeightClass::Heavy),
            "A" => Some(WeightClass::Assault),
            "SH" | "C" => Some(WeightClass::Colossal),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WeightClass::UltraLight => "Ultra-Light",
            WeightClass::Light => "Light",
            WeightClass::Medium => "Medium",
            WeightClass::Heavy => "Heavy",
            WeightClass::Assault => "Assault",
            WeightClass::Colossal => "Colossal",
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeightClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
            .or_else(|| Self::ALL.into_iter().find(|w| w.name().eq_ignore_ascii_case(s)))
            .ok_or_else(|| format!("unknown weight class: {}", s))
    }
}

// ============================================================================
// Unit type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Mek,
    Tank,
    BattleArmor,
    Infantry,
    ProtoMek,
    Vtol,
    Naval,
    GunEmplacement,
    ConvFighter,
    Aero,
    SmallCraft,
    Dropship,
}

impl UnitType {
    pub const ALL: [UnitType; 12] = [
        UnitType::Mek,
        UnitType::Tank,
        UnitType::BattleArmor,
        UnitType::Infantry,
        UnitType::ProtoMek,
        UnitType::Vtol,
        UnitType::Naval,
        UnitType::GunEmplacement,
        UnitType::ConvFighter,
        UnitType::Aero,
        UnitType::SmallCraft,
        UnitType::Dropship,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnitType::Mek => "Mek",
            UnitType::Tank => "Tank",
            UnitType::BattleArmor => "BattleArmor",
            UnitType::Infantry => "Infantry",
            UnitType::ProtoMek => "ProtoMek",
            UnitType::Vtol => "VTOL",
            UnitType::Naval => "Naval",
            UnitType::GunEmplacement => "Gun Emplacement",
            UnitType::ConvFighter => "Conventional Fighter",
            UnitType::Aero => "AeroSpaceFighter",
            UnitType::SmallCraft => "Small Craft",
            UnitType::Dropship => "Dropship",
        }
    }

    /// Weight class is only tracked for these types
    pub fn has_weight_class(self) -> bool {
        matches!(
            self,
            UnitType::Mek | UnitType::Aero | UnitType::Tank | UnitType::BattleArmor
        )
    }

    /// Types that can be built as omni units
    pub fn is_omni_capable(self) -> bool {
        matches!(self, UnitType::Mek | UnitType::Aero | UnitType::Tank)
    }

    pub fn is_aerospace(self) -> bool {
        matches!(
            self,
            UnitType::ConvFighter | UnitType::Aero | UnitType::SmallCraft | UnitType::Dropship
        )
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s) || format!("{:?}", t).eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown unit type: {}", s))
    }
}

// ============================================================================
// Movement mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MovementMode {
    Biped,
    Tripod,
    Quad,
    Tracked,
    Wheeled,
    Hover,
    Wige,
    Vtol,
    Naval,
    Hydrofoil,
    Submarine,
    InfLeg,
    InfMotorized,
    InfJump,
    Aerodyne,
    Spheroid,
}

// ============================================================================
// Mission role
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MissionRole {
    Command,
    Recon,
    FireSupport,
    Artillery,
    MissileArtillery,
    FieldGun,
    AntiMek,
    Apc,
    InfSupport,
    Urban,
    Cavalry,
    Raider,
    Training,
    Interceptor,
    GroundSupport,
    Escort,
}

impl MissionRole {
    /// Whether this role is meaningful for the given unit type
    pub fn fits_unit_type(self, unit_type: Option<UnitType>) -> bool {
        let Some(ut) = unit_type else {
            return true;
        };
        match self {
            MissionRole::Apc => matches!(ut, UnitType::Tank | UnitType::Vtol | UnitType::Naval),
            MissionRole::InfSupport => {
                matches!(ut, UnitType::Mek | UnitType::Tank | UnitType::Vtol | UnitType::ProtoMek)
            }
            MissionRole::AntiMek => matches!(ut, UnitType::Infantry | UnitType::BattleArmor),
            MissionRole::FieldGun => ut == UnitType::Infantry,
            MissionRole::Interceptor | MissionRole::GroundSupport | MissionRole::Escort => {
                ut.is_aerospace()
            }
            MissionRole::Cavalry | MissionRole::Raider | MissionRole::Urban => !ut.is_aerospace(),
            MissionRole::Command
            | MissionRole::Recon
            | MissionRole::FireSupport
            | MissionRole::Artillery
            | MissionRole::MissileArtillery
            | MissionRole::Training => true,
        }
    }

    pub fn is_artillery(self) -> bool {
        matches!(self, MissionRole::Artillery | MissionRole::MissileArtillery)
    }
}

// ============================================================================
// Flags
// ============================================================================

/// Known structural flags on a force node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ForceFlag {
    Omni,
    Nova,
    MagClamp,
}

impl ForceFlag {
    pub fn tag(self) -> &'static str {
        match self {
            ForceFlag::Omni => "omni",
            ForceFlag::Nova => "nova",
            ForceFlag::MagClamp => "mag_clamp",
        }
    }
}

/// Flag set with an escape hatch for caller-defined tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceFlags {
    known: BTreeSet<ForceFlag>,
    extra: BTreeSet<String>,
}

impl ForceFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, flag: ForceFlag) -> bool {
        self.known.contains(&flag)
    }

    pub fn insert(&mut self, flag: ForceFlag) {
        self.known.insert(flag);
    }

    pub fn remove(&mut self, flag: ForceFlag) {
        self.known.remove(&flag);
    }

    /// Add a tag by name. Known tags map onto [`ForceFlag`].
    pub fn insert_tag(&mut self, tag: &str) {
        match tag {
            "omni" => self.insert(ForceFlag::Omni),
            "nova" => self.insert(ForceFlag::Nova),
            "mag_clamp" => self.insert(ForceFlag::MagClamp),
            other => {
                self.extra.insert(other.to_string());
            }
        }
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.known.iter().any(|f| f.tag() == tag) || self.extra.contains(tag)
    }

    pub fn extend(&mut self, other: &ForceFlags) {
        self.known.extend(other.known.iter().copied());
        self.extra.extend(other.extra.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.extra.is_empty()
    }
}

// ============================================================================
// Misc node attributes
// ============================================================================

/// Crew experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Experience {
    Green,
    #[default]
    Regular,
    Veteran,
}

impl Experience {
    /// Base (gunnery, piloting) skills for an officer of this experience
    pub fn base_skills(self) -> (u8, u8) {
        match self {
            Experience::Green => (5, 6),
            Experience::Regular => (4, 5),
            Experience::Veteran => (3, 4),
        }
    }
}

/// Strength of a formation relative to its echelon's standard size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeMod {
    Understrength,
    #[default]
    Standard,
    Reinforced,
}

impl SizeMod {
    pub fn value(self) -> i8 {
        match self {
            SizeMod::Understrength => -1,
            SizeMod::Standard => 0,
            SizeMod::Reinforced => 1,
        }
    }
}

/// How an internal node delegates generation to its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationRule {
    Model,
    Chassis,
    Group,
}

impl FromStr for GenerationRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(GenerationRule::Model),
            "chassis" => Ok(GenerationRule::Chassis),
            "group" => Ok(GenerationRule::Group),
            _ => Err(format!("unknown generation rule: {}", s)),
        }
    }
}

/// C3 network requirement passed to catalog and formation queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NetworkMask(pub u32);

impl NetworkMask {
    pub const NONE: NetworkMask = NetworkMask(0);
    pub const C3M: NetworkMask = NetworkMask(1);
    pub const C3S: NetworkMask = NetworkMask(1 << 1);
    pub const C3I: NetworkMask = NetworkMask(1 << 2);
    pub const NOVA: NetworkMask = NetworkMask(1 << 3);
}
