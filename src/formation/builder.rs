//! Catalog-backed formation builder

use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

use super::{FormationBuilder, FormationType, UnitParameters};
use crate::catalog::{TableQuery, UnitCatalog, UnitRecord};
use crate::core::types::NetworkMask;

/// Draws every formation slot from the catalog's unit tables
///
/// Each parameter tuple is drawn independently. The formation's preferred
/// roles double the weight of matching units. With a group-count override,
/// each tuple is split into that many groups and every member of a group
/// receives the same unit.
pub struct TableFormationBuilder<'a> {
    catalog: &'a dyn UnitCatalog,
}

impl<'a> TableFormationBuilder<'a> {
    pub fn new(catalog: &'a dyn UnitCatalog) -> Self {
        Self { catalog }
    }

    fn draw(
        &self,
        formation: &FormationType,
        params: &UnitParameters,
        network: NetworkMask,
        rng: &mut ChaCha8Rng,
    ) -> Option<UnitRecord> {
        let mut roles: BTreeSet<_> = params
            .roles
            .iter()
            .copied()
            .filter(|r| r.fits_unit_type(params.unit_type))
            .collect();
        roles.extend(
            formation
                .preferred_roles
                .iter()
                .copied()
                .filter(|r| r.fits_unit_type(params.unit_type)),
        );
        let query = TableQuery {
            faction: params.faction.clone(),
            unit_type: params.unit_type,
            year: params.year,
            rating: params.rating.clone(),
            weight_classes: Vec::new(),
            network,
            movement_modes: params.movement_modes.clone(),
            roles,
            role_strictness: 1,
        };
        let table = self.catalog.find_table(&query);
        table.generate_unit(rng, None).cloned()
    }
}

impl FormationBuilder for TableFormationBuilder<'_> {
    fn generate_formation(
        &self,
        formation: &FormationType,
        params: &[UnitParameters],
        counts: &[usize],
        network: NetworkMask,
        num_groups: usize,
        rng: &mut ChaCha8Rng,
    ) -> Vec<UnitRecord> {
        let mut units = Vec::new();
        for (p, &count) in params.iter().zip(counts) {
            if count == 0 {
                continue;
            }
            let group_size = if num_groups > 0 {
                count.div_ceil(num_groups)
            } else {
                1
            };
            let mut remaining = count;
            while remaining > 0 {
                let Some(unit) = self.draw(formation, p, network, rng) else {
                    tracing::debug!(
                        formation = %formation.name,
                        unit_type = ?p.unit_type,
                        "Formation slot could not be filled"
                    );
                    return units;
                };
                let n = group_size.min(remaining);
                units.extend(std::iter::repeat(unit).take(n));
                remaining -= n;
            }
        }
        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::core::types::{MissionRole, MovementMode, UnitType, WeightClass};
    use rand::SeedableRng;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_model(
                UnitRecord::new("Shilone", "SL-17", UnitType::Aero, Some(WeightClass::Medium), MovementMode::Aerodyne)
                    .with_roles([MissionRole::Interceptor]),
                &[("DC", 6)],
            )
            .with_model(
                UnitRecord::new("Sparrowhawk", "SPR-H5", UnitType::Aero, Some(WeightClass::Light), MovementMode::Aerodyne),
                &[("DC", 6)],
            )
    }

    fn params(unit_type: UnitType) -> UnitParameters {
        UnitParameters {
            faction: "DC".into(),
            unit_type: Some(unit_type),
            year: 3025,
            rating: None,
            movement_modes: BTreeSet::new(),
            roles: BTreeSet::new(),
        }
    }

    #[test]
    fn test_group_override_pairs_units() {
        let catalog = catalog();
        let builder = TableFormationBuilder::new(&catalog);
        let formation = FormationType::named("Aerospace Superiority").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let units = builder.generate_formation(
            &formation,
            &[params(UnitType::Aero)],
            &[6],
            NetworkMask::NONE,
            3,
            &mut rng,
        );
        assert_eq!(units.len(), 6);
        for pair in units.chunks(2) {
            assert_eq!(pair[0].key, pair[1].key);
        }
    }

    #[test]
    fn test_unfillable_slot_stops_early() {
        let catalog = catalog();
        let builder = TableFormationBuilder::new(&catalog);
        let formation = FormationType::named("Battle").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let units = builder.generate_formation(
            &formation,
            &[params(UnitType::Aero), params(UnitType::Mek)],
            &[2, 2],
            NetworkMask::NONE,
            0,
            &mut rng,
        );
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.unit_type == UnitType::Aero));
    }
}
