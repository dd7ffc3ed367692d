//! Formation types and the formation builder interface
//!
//! A formation type restricts which unit types may take part and biases
//! which roles are drawn. Turning a batch of parameter tuples into concrete
//! units is the job of a [`FormationBuilder`].

pub mod builder;
pub mod composer;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::UnitRecord;
use crate::core::types::{MissionRole, MovementMode, NetworkMask, UnitType};

pub use builder::TableFormationBuilder;

/// Named composite-formation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationType {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Unit types that may take part. Empty allows every type.
    #[serde(default)]
    pub allowed_unit_types: BTreeSet<UnitType>,
    /// Roles favoured when drawing units for this formation
    #[serde(default)]
    pub preferred_roles: BTreeSet<MissionRole>,
}

const GROUND: [UnitType; 5] = [
    UnitType::Mek,
    UnitType::Tank,
    UnitType::Vtol,
    UnitType::ProtoMek,
    UnitType::BattleArmor,
];

impl FormationType {
    pub fn new(name: &str, category: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            category: category.map(str::to_string),
            allowed_unit_types: BTreeSet::new(),
            preferred_roles: BTreeSet::new(),
        }
    }

    pub fn allowing(mut self, types: impl IntoIterator<Item = UnitType>) -> Self {
        self.allowed_unit_types.extend(types);
        self
    }

    pub fn preferring(mut self, roles: impl IntoIterator<Item = MissionRole>) -> Self {
        self.preferred_roles.extend(roles);
        self
    }

    /// Look up one of the standard formation types by name
    pub fn named(name: &str) -> Option<Self> {
        let ft = match name {
            "Battle" => Self::new("Battle", Some("Battle")).allowing(GROUND),
            "Striker" => Self::new("Striker", Some("Striker/Cavalry"))
                .allowing(GROUND)
                .preferring([MissionRole::Raider, MissionRole::Cavalry]),
            "Fire" => Self::new("Fire", Some("Fire"))
                .allowing(GROUND)
                .preferring([MissionRole::FireSupport]),
            "Recon" => Self::new("Recon", Some("Recon"))
                .allowing(GROUND)
                .preferring([MissionRole::Recon]),
            "Command" => Self::new("Command", Some("Command"))
                .allowing(GROUND)
                .preferring([MissionRole::Command]),
            "Urban" => Self::new("Urban", Some("Urban"))
                .allowing(GROUND)
                .preferring([MissionRole::Urban]),
            "Nova" => Self::new("Nova", Some("Battle")).allowing([
                UnitType::Mek,
                UnitType::Tank,
                UnitType::Vtol,
                UnitType::BattleArmor,
                UnitType::Infantry,
            ]),
            "Aerospace Superiority" => {
                Self::new("Aerospace Superiority", Some("Aerospace Superiority Squadron"))
                    .allowing([UnitType::Aero, UnitType::ConvFighter])
                    .preferring([MissionRole::Interceptor])
            }
            "Strike" => Self::new("Strike", Some("Strike Squadron"))
                .allowing([UnitType::Aero, UnitType::ConvFighter])
                .preferring([MissionRole::GroundSupport]),
            _ => return None,
        };
        Some(ft)
    }

    pub fn is_allowed_unit_type(&self, unit_type: UnitType) -> bool {
        self.allowed_unit_types.is_empty() || self.allowed_unit_types.contains(&unit_type)
    }

    /// Category as used in formation names ("Striker/Cavalry" reads as "Striker")
    pub fn short_category(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(|c| c.replace("Striker/Cavalry", "Striker").replace(" Squadron", ""))
    }
}

/// Table parameters shared by every node grouped into one formation slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitParameters {
    pub faction: String,
    pub unit_type: Option<UnitType>,
    pub year: i32,
    /// Rating code on the catalog faction's scale
    pub rating: Option<String>,
    pub movement_modes: BTreeSet<MovementMode>,
    pub roles: BTreeSet<MissionRole>,
}

/// Produces the units of a formation
///
/// The result lists units for `params[0]` first, then `params[1]`, and so
/// on, `counts[i]` for each. A builder that cannot complete a slot may stop
/// early; an empty result means the formation could not be built at all.
pub trait FormationBuilder {
    fn generate_formation(
        &self,
        formation: &FormationType,
        params: &[UnitParameters],
        counts: &[usize],
        network: NetworkMask,
        num_groups: usize,
        rng: &mut ChaCha8Rng,
    ) -> Vec<UnitRecord>;
}
