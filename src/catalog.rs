//! Name ↔ national-dex-number mapping, built once at startup.
//!
//! The mapping is loaded from a JSON snapshot on disk when one exists, otherwise it is
//! derived from the remote species list (one bulk request) and written back. After
//! construction only the number → name side may change, and only in memory, when the
//! resolver fills a missing entry from the remote source.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{DexError, SpeciesSource};

#[derive(Debug)]
pub(crate) struct Catalog {
    name_to_number: HashMap<String, u32>,
    number_to_name: RwLock<BTreeMap<u32, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CatalogOrigin {
    Snapshot,
    Remote,
}

/// On-disk layout. JSON object keys are always strings, so `number_to_name` is read
/// with string keys and coerced in `Catalog::from_snapshot`.
#[derive(Debug, Deserialize)]
struct SnapshotIn {
    name_to_number: HashMap<String, u32>,
    number_to_name: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct SnapshotOut<'a> {
    name_to_number: BTreeMap<&'a str, u32>,
    number_to_name: BTreeMap<u32, &'a str>,
}

impl Catalog {
    /// Assigns 1..=N in the order given. Repeated names keep their first number and
    /// do not consume an index.
    pub(crate) fn from_ordered_names<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut name_to_number: HashMap<String, u32> = HashMap::new();
        let mut number_to_name: BTreeMap<u32, String> = BTreeMap::new();
        let mut next = 1u32;
        for name in names {
            if name_to_number.contains_key(&name) {
                warn!("duplicate species '{name}' in remote list, keeping #{}", name_to_number[&name]);
                continue;
            }
            name_to_number.insert(name.clone(), next);
            number_to_name.insert(next, name);
            next += 1;
        }
        Self {
            name_to_number,
            number_to_name: RwLock::new(number_to_name),
        }
    }

    /// Catalog size N; the last species has this number.
    pub(crate) fn len(&self) -> u32 {
        self.name_to_number.len() as u32
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.name_to_number.is_empty()
    }

    pub(crate) fn number_of(&self, name: &str) -> Option<u32> {
        self.name_to_number.get(name).copied()
    }

    pub(crate) fn name_of(&self, number: u32) -> Option<String> {
        self.number_to_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&number)
            .cloned()
    }

    /// In-memory only; the snapshot on disk is not rewritten.
    pub(crate) fn remember(&self, number: u32, name: String) {
        self.number_to_name
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(number, name);
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), DexError> {
        let number_to_name = self
            .number_to_name
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let snapshot = SnapshotOut {
            name_to_number: self
                .name_to_number
                .iter()
                .map(|(name, n)| (name.as_str(), *n))
                .collect(),
            number_to_name: number_to_name
                .iter()
                .map(|(n, name)| (*n, name.as_str()))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub(crate) fn load(path: &Path) -> Result<Self, DexError> {
        let data = fs::read_to_string(path)?;
        let snapshot: SnapshotIn = serde_json::from_str(&data)?;
        Self::from_snapshot(path, snapshot)
    }

    fn from_snapshot(path: &Path, snapshot: SnapshotIn) -> Result<Self, DexError> {
        let size = snapshot.name_to_number.len() as u32;
        if size == 0 {
            return Err(DexError::corrupt(path, "empty name_to_number"));
        }

        let mut seen = HashSet::with_capacity(size as usize);
        for (name, &n) in &snapshot.name_to_number {
            if n == 0 || n > size {
                return Err(DexError::corrupt(
                    path,
                    format!("'{name}' has #{n}, outside 1..={size}"),
                ));
            }
            if !seen.insert(n) {
                return Err(DexError::corrupt(path, format!("#{n} assigned twice")));
            }
        }

        let mut number_to_name = BTreeMap::new();
        for (key, name) in snapshot.number_to_name {
            let n: u32 = key
                .trim()
                .parse()
                .map_err(|_| DexError::corrupt(path, format!("non-numeric key '{key}'")))?;
            if snapshot.name_to_number.get(&name) != Some(&n) {
                return Err(DexError::corrupt(
                    path,
                    format!("#{n} -> '{name}' disagrees with name_to_number"),
                ));
            }
            number_to_name.insert(n, name);
        }

        // name_to_number is a permutation of 1..=size here, so any hole on the
        // number side can be filled from it.
        let missing = size as usize - number_to_name.len();
        if missing > 0 {
            for (name, &n) in &snapshot.name_to_number {
                number_to_name.entry(n).or_insert_with(|| name.clone());
            }
            warn!(
                "{}: rebuilt {missing} missing number_to_name entries",
                path.display()
            );
        }

        Ok(Self {
            name_to_number: snapshot.name_to_number,
            number_to_name: RwLock::new(number_to_name),
        })
    }
}

#[cfg(test)]
impl Catalog {
    /// Drops a number → name entry to emulate a stale in-memory mapping.
    pub(crate) fn forget(&self, number: u32) {
        self.number_to_name
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&number);
    }
}

/// Snapshot first; a missing, unreadable or inconsistent snapshot falls through to
/// the remote source.
pub(crate) fn load_catalog(
    path: &Path,
    source: &dyn SpeciesSource,
) -> Result<(Catalog, CatalogOrigin), DexError> {
    if path.exists() {
        match Catalog::load(path) {
            Ok(catalog) => {
                info!("loaded {} species from {}", catalog.len(), path.display());
                return Ok((catalog, CatalogOrigin::Snapshot));
            }
            Err(err) => warn!("ignoring snapshot: {err}"),
        }
    }
    let catalog = rebuild_catalog(path, source)?;
    Ok((catalog, CatalogOrigin::Remote))
}

/// One bulk request; index order is taken from the response as-is.
pub(crate) fn fetch_catalog(source: &dyn SpeciesSource) -> Result<Catalog, DexError> {
    let catalog = Catalog::from_ordered_names(source.fetch_species_list()?);
    if catalog.is_empty() {
        return Err(DexError::SourceUnavailable("empty species list".into()));
    }
    info!("fetched {} species from remote source", catalog.len());
    Ok(catalog)
}

/// Startup path: a snapshot that cannot be written is logged, not fatal.
pub(crate) fn rebuild_catalog(path: &Path, source: &dyn SpeciesSource) -> Result<Catalog, DexError> {
    let catalog = fetch_catalog(source)?;
    if let Err(err) = catalog.save(path) {
        warn!("could not write snapshot {}: {err}", path.display());
    }
    Ok(catalog)
}
