use log::{debug, info, warn};
use serde_json::{Map, Value, json};

use crate::{Catalog, DexError, SpeciesSource, normalize_name};

pub(crate) const DEFAULT_SPRITE_TEMPLATE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/{n}.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Direction {
    #[value(name = "antecedente")]
    Predecessor,
    #[value(name = "successore")]
    Successor,
}

impl Direction {
    /// Field name used for the neighbor in responses, and the route prefix.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Direction::Predecessor => "antecedente",
            Direction::Successor => "successore",
        }
    }

    fn target(self, number: u32, size: u32) -> Option<u32> {
        match self {
            Direction::Predecessor if number > 1 => Some(number - 1),
            Direction::Successor if number < size => Some(number + 1),
            _ => None,
        }
    }

    fn boundary_message(self, number: u32) -> String {
        match self {
            Direction::Predecessor => format!("È il primo Pokémon (#{number:03})."),
            Direction::Successor => format!("È l'ultimo Pokémon (#{number:03})."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NeighborResult {
    pub(crate) pokemon: String,
    pub(crate) number: u32,
    pub(crate) direction: Direction,
    pub(crate) sprite: Option<String>,
    pub(crate) neighbor: Option<String>,
    pub(crate) neighbor_number: Option<u32>,
    pub(crate) message: Option<String>,
}

impl NeighborResult {
    pub(crate) fn to_json(&self) -> Value {
        let label = self.direction.label();
        let mut out = Map::new();
        out.insert("pokemon".into(), json!(self.pokemon));
        out.insert("number".into(), json!(self.number));
        if let Some(sprite) = &self.sprite {
            out.insert("sprite".into(), json!(sprite));
        }
        out.insert(label.into(), json!(self.neighbor));
        if let Some(n) = self.neighbor_number {
            out.insert(format!("{label}_number"), json!(n));
        }
        if let Some(message) = &self.message {
            out.insert("message".into(), json!(message));
        }
        Value::Object(out)
    }
}

/// Folds several results for the same name into one object, as printed by
/// `lookup` without a direction. Boundary messages are joined with a space.
pub(crate) fn merge_results(results: &[NeighborResult]) -> Value {
    let mut merged = Map::new();
    for result in results {
        let Value::Object(fields) = result.to_json() else {
            continue;
        };
        for (key, value) in fields {
            if key == "message" {
                if let (Some(Value::String(prev)), Some(next)) = (merged.get(&key), value.as_str()) {
                    let joined = format!("{prev} {next}");
                    merged.insert(key, Value::String(joined));
                    continue;
                }
            }
            merged.insert(key, value);
        }
    }
    Value::Object(merged)
}

pub(crate) fn sprite_url(template: &str, number: u32) -> String {
    template.replace("{n}", &number.to_string())
}

/// Looks up `raw_name` and returns its neighbor in `direction`.
///
/// `NotFound` is the only error. A neighbor number missing from the catalog is
/// fetched from `source` once and remembered in memory; if that fetch fails the
/// neighbor name is reported as null.
pub(crate) fn resolve_neighbor(
    raw_name: &str,
    direction: Direction,
    catalog: &Catalog,
    source: &dyn SpeciesSource,
    sprite_template: Option<&str>,
) -> Result<NeighborResult, DexError> {
    let pokemon = normalize_name(raw_name);
    let number = catalog
        .number_of(&pokemon)
        .ok_or_else(|| DexError::NotFound(pokemon.clone()))?;
    let sprite = sprite_template.map(|t| sprite_url(t, number));

    let Some(target) = direction.target(number, catalog.len()) else {
        debug!("'{pokemon}' (#{number}) has no {}", direction.label());
        return Ok(NeighborResult {
            pokemon,
            number,
            direction,
            sprite,
            neighbor: None,
            neighbor_number: None,
            message: Some(direction.boundary_message(number)),
        });
    };

    Ok(NeighborResult {
        pokemon,
        number,
        direction,
        sprite,
        neighbor: name_for_number(target, catalog, source),
        neighbor_number: Some(target),
        message: None,
    })
}

fn name_for_number(number: u32, catalog: &Catalog, source: &dyn SpeciesSource) -> Option<String> {
    if let Some(name) = catalog.name_of(number) {
        return Some(name);
    }
    info!("#{number} missing from catalog, asking remote source");
    match source.fetch_species_name(number) {
        Ok(name) if catalog.number_of(&name) == Some(number) => {
            catalog.remember(number, name.clone());
            Some(name)
        }
        Ok(name) => {
            warn!(
                "remote source names #{number} '{name}', catalog has it as {:?}; not caching",
                catalog.number_of(&name)
            );
            None
        }
        Err(err) => {
            warn!("fallback lookup for #{number} failed: {err}");
            None
        }
    }
}
