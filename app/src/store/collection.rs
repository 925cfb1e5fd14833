use riego_core::Entity;
use std::sync::Arc;

/// Flat copy-on-write collection. Readers hold `Arc` snapshots, so a
/// mutation never shows up half-applied in a snapshot taken before it.
#[derive(Debug, Clone)]
pub struct Collection<T: Entity> {
    items: Arc<Vec<T>>,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Collection {
            items: Arc::new(Vec::new()),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.items.clone()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn get(&self, id: i32) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn push(&mut self, item: T) {
        Arc::make_mut(&mut self.items).push(item);
    }

    pub fn extend(&mut self, items: Vec<T>) {
        Arc::make_mut(&mut self.items).extend(items);
    }

    pub fn replace(&mut self, items: Vec<T>) {
        self.items = Arc::new(items);
    }

    pub fn update(&mut self, id: i32, patch: T::Patch) -> Option<T> {
        self.modify(id, |item| item.apply(patch))
    }

    /// Runs `f` on the record with `id`, a no-op if there is none
    pub fn modify<F: FnOnce(&mut T)>(&mut self, id: i32, f: F) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        let item = &mut Arc::make_mut(&mut self.items)[index];
        f(item);
        Some(item.clone())
    }

    pub fn modify_all<F: FnMut(&mut T)>(&mut self, f: F) {
        Arc::make_mut(&mut self.items).iter_mut().for_each(f);
    }

    pub fn remove(&mut self, id: i32) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(Arc::make_mut(&mut self.items).remove(index))
    }

    /// Drops every record matching `pred` and returns them
    pub fn remove_where<P: Fn(&T) -> bool>(&mut self, pred: P) -> Vec<T> {
        if !self.items.iter().any(|item| pred(item)) {
            return Vec::new();
        }
        let (removed, kept): (Vec<T>, Vec<T>) =
            self.items.iter().cloned().partition(|item| pred(item));
        self.items = Arc::new(kept);
        removed
    }
}
