//! Gesture → action binding table
//!
//! The table is replaced wholesale by the UI thread and read once per frame by
//! the decision loop. [`SharedBindings`] hands out immutable `Arc` snapshots, so
//! a decision tick always sees one complete table and a writer never waits on
//! a reader.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::actions::ActionSpec;

/// Name of the URL preset seeded into a fresh store
pub const DEFAULT_URL_PRESET: &str = "YouTube";

/// Mapping from gesture label to action spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    bindings: BTreeMap<String, ActionSpec>,
}

impl BindingTable {
    /// A table with no bindings
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Returns the action bound to a gesture label
    pub fn get(&self, label: &str) -> Option<&ActionSpec> {
        self.bindings.get(label)
    }

    /// Bind a label, returning the action it was previously bound to
    pub fn bind(
        &mut self,
        label: impl Into<String>,
        action: impl Into<ActionSpec>,
    ) -> Option<ActionSpec> {
        self.bindings.insert(label.into(), action.into())
    }

    /// Remove a label's binding
    pub fn unbind(&mut self, label: &str) -> Option<ActionSpec> {
        self.bindings.remove(label)
    }

    /// Builder-style [`bind`](Self::bind)
    pub fn with(mut self, label: impl Into<String>, action: impl Into<ActionSpec>) -> Self {
        self.bind(label, action);
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionSpec)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Plain string map, as stored in the config file
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str().to_string()))
            .collect()
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::empty()
            .with("Thumb_Up", "VOL_UP")
            .with("Thumb_Down", "VOL_DOWN")
            .with("Open_Palm", "START_SCREENSAVER")
            .with("Pointing_Up", "DISPLAY_SLEEP")
            .with("Closed_Fist", "OPEN_MAPS")
            .with("Victory", "OPEN_LAUNCHPAD")
            .with("ILoveYou", ActionSpec::open_url(DEFAULT_URL_PRESET))
    }
}

impl From<&BTreeMap<String, String>> for BindingTable {
    fn from(map: &BTreeMap<String, String>) -> Self {
        Self {
            bindings: map
                .iter()
                .map(|(k, v)| (k.clone(), ActionSpec::new(v.clone())))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<ActionSpec>> FromIterator<(K, V)> for BindingTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            bindings: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Copy-on-write handle to the live binding table
#[derive(Debug, Clone)]
pub struct SharedBindings {
    current: Arc<RwLock<Arc<BindingTable>>>,
}

impl SharedBindings {
    pub fn new(table: BindingTable) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// The table as of now. Later replacements do not affect the snapshot.
    pub fn snapshot(&self) -> Arc<BindingTable> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a whole new table
    pub fn replace(&self, table: BindingTable) {
        let len = table.len();
        *self.current.write() = Arc::new(table);
        tracing::info!("Binding table replaced ({} bindings)", len);
    }

    /// Edit a copy of the current table and publish it
    pub fn update<F>(&self, edit: F)
    where
        F: FnOnce(&mut BindingTable),
    {
        let mut guard = self.current.write();
        let mut next = BindingTable::clone(&guard);
        edit(&mut next);
        *guard = Arc::new(next);
    }
}

impl Default for SharedBindings {
    fn default() -> Self {
        Self::new(BindingTable::default())
    }
}
