// Shared by the machine's available ingredients (names) and a recipe being
// built (`IngredientRef`).

use crate::model::IngredientRef;
use log::{debug, warn};

pub const MAX_SELECTED: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("You can only select up to {capacity} ingredients.")]
pub struct SelectionFull {
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Identity used for set membership.
pub trait SelectionKey {
    type Key: PartialEq + ?Sized;
    fn key(&self) -> &Self::Key;
}

impl SelectionKey for String {
    type Key = str;
    fn key(&self) -> &str {
        self
    }
}

impl SelectionKey for IngredientRef {
    type Key = u32;
    fn key(&self) -> &u32 {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet<T = String> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> Default for SelectionSet<T> {
    fn default() -> Self {
        Self { items: Vec::new(), capacity: MAX_SELECTED }
    }
}

impl<T: SelectionKey + Clone> SelectionSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a saved list; duplicates collapse and overflow is dropped.
    pub fn from_saved(saved: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        for item in saved {
            if set.contains(item.key()) {
                continue;
            }
            if set.items.len() == set.capacity {
                warn!("[SELECTION] Saved selection exceeds {} entries, dropping the rest", set.capacity);
                break;
            }
            set.items.push(item);
        }
        set
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    /// Flip membership. Adding to a full set fails and leaves it unchanged.
    pub fn toggle(&mut self, item: T) -> Result<Toggle, SelectionFull> {
        if let Some(pos) = self.items.iter().position(|i| i.key() == item.key()) {
            self.items.remove(pos);
            debug!("[SELECTION] Removed entry, {} selected", self.items.len());
            return Ok(Toggle::Removed);
        }
        if self.items.len() >= self.capacity {
            debug!("[SELECTION] Rejected add, capacity {} reached", self.capacity);
            return Err(SelectionFull { capacity: self.capacity });
        }
        self.items.push(item);
        debug!("[SELECTION] Added entry, {} selected", self.items.len());
        Ok(Toggle::Added)
    }

    pub fn remove(&mut self, key: &T::Key) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.key() != key);
        before != self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}
