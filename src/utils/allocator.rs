use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable handle to a body stored in an [`Arena`].
///
/// The generation prevents a handle from resolving to a body that was removed
/// and whose slot got reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct BodyId {
    index: usize,
    generation: u32,
}

impl BodyId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Generational arena addressed by [`BodyId`].
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> BodyId {
        if let Some(index) = self.free_list.pop_front() {
            self.slots[index] = Some(item);
            return BodyId::new(index, self.generations[index]);
        }

        let index = self.slots.len();
        self.slots.push(Some(item));
        self.generations.push(0);
        BodyId::new(index, 0)
    }

    pub fn remove(&mut self, id: BodyId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        let item = self.slots[id.index].take();
        self.generations[id.index] = self.generations[id.index].wrapping_add(1);
        self.free_list.push_back(id.index);
        item
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.generations.get(id.index) == Some(&id.generation)
            && matches!(self.slots.get(id.index), Some(Some(_)))
    }

    pub fn get(&self, id: BodyId) -> Option<&T> {
        if self.contains(id) {
            self.slots[id.index].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut T> {
        if self.contains(id) {
            self.slots[id.index].as_mut()
        } else {
            None
        }
    }

    /// Borrows two distinct entries mutably, in argument order.
    pub fn get2_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut T, &mut T)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (low, high, flipped) = if a.index < b.index {
            (a.index, b.index, false)
        } else {
            (b.index, a.index, true)
        };

        let (left, right) = self.slots.split_at_mut(high);
        let first = left[low].as_mut()?;
        let second = right[0].as_mut()?;

        if flipped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    /// Iterates live entries together with their ids, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &T)> + '_ {
        self.slots
            .iter()
            .zip(self.generations.iter())
            .enumerate()
            .filter_map(|(index, (slot, generation))| {
                slot.as_ref().map(|item| (BodyId::new(index, *generation), item))
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyId, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .zip(self.generations.iter())
            .enumerate()
            .filter_map(|(index, (slot, generation))| {
                slot.as_mut().map(|item| (BodyId::new(index, *generation), item))
            })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
