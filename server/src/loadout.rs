//! Opaque loadout assignment for joining players
//!
//! The movement core does not interpret weapons or abilities; it only
//! carries the rolled identifiers on the session for display and logging.
//! Content definitions live with external collaborators, so entries here
//! are plain id/name/weight triples.

use rand::Rng;
use std::collections::HashMap;

pub const PRIMARY: &str = "primary";
pub const SIDEARM: &str = "sidearm";
pub const ABILITY: &str = "ability";

/// One rollable entry. Higher weight, more common.
#[derive(Debug, Clone)]
pub struct LoadoutItem {
    pub id: String,
    pub name: String,
    pub weight: f32,
}

impl LoadoutItem {
    pub fn new(id: &str, name: &str, weight: f32) -> Self {
        LoadoutItem {
            id: id.to_string(),
            name: name.to_string(),
            weight,
        }
    }
}

/// Registry of rollable items grouped by category.
#[derive(Debug, Default)]
pub struct LoadoutTable {
    pools: HashMap<String, Vec<LoadoutItem>>,
}

impl LoadoutTable {
    pub fn new() -> Self {
        LoadoutTable::default()
    }

    /// A baseline table matching the stock inventory. Callers with real
    /// content registries replace this wholesale.
    pub fn standard() -> Self {
        let mut table = LoadoutTable::new();
        table.register(PRIMARY, LoadoutItem::new("pulse_rifle", "Pulse Rifle", 3.0));
        table.register(PRIMARY, LoadoutItem::new("kinetic_smg", "Kinetic SMG", 1.0));
        table.register(PRIMARY, LoadoutItem::new("evo_shotgun", "Evo Shotgun", 2.0));
        table.register(
            SIDEARM,
            LoadoutItem::new("winged_revolver", "Winged Revolver", 1.0),
        );
        table.register(ABILITY, LoadoutItem::new("blink_dash", "Blink Dash", 1.0));
        table.register(ABILITY, LoadoutItem::new("sensor_dart", "Sensor Dart", 1.0));
        table
    }

    pub fn register(&mut self, category: &str, item: LoadoutItem) {
        self.pools.entry(category.to_string()).or_default().push(item);
    }

    /// Rolls one item from a category by rarity weight.
    ///
    /// An unknown or empty category yields `None` ("none available");
    /// callers treat that as a no-op roll, never an error.
    pub fn roll<R: Rng>(&self, category: &str, rng: &mut R) -> Option<&LoadoutItem> {
        let pool = self.pools.get(category)?;
        if pool.is_empty() {
            return None;
        }

        let total: f32 = pool.iter().map(|item| item.weight).sum();
        let mut roll = rng.gen::<f32>() * total;
        for item in pool {
            roll -= item.weight;
            if roll <= 0.0 {
                return Some(item);
            }
        }
        pool.last()
    }
}
