//! Synchronized Collection Helpers
//!
//! List/focus rules shared by every resource store. Each store keeps its
//! state in a `reactive_stores::Store` and applies these helpers to the
//! field guards, so readers see one consistent update per field.

/// Server-owned entity identified by an integer ID
pub trait Resource: Clone + Send + Sync + 'static {
    fn id(&self) -> u32;
}

/// Replace the entry with the same ID in place.
///
/// Returns false (and leaves the list alone) when no entry matches.
pub fn replace_by_id<T: Resource>(items: &mut Vec<T>, updated: &T) -> bool {
    match items.iter_mut().find(|item| item.id() == updated.id()) {
        Some(item) => {
            *item = updated.clone();
            true
        }
        None => false,
    }
}

/// Remove every entry with the given ID
pub fn remove_by_id<T: Resource>(items: &mut Vec<T>, id: u32) {
    items.retain(|item| item.id() != id);
}

/// Append at the end; a stale entry with the same ID is dropped first
pub fn append_unique<T: Resource>(items: &mut Vec<T>, created: T) {
    remove_by_id(items, created.id());
    items.push(created);
}

pub fn focus_is<T: Resource>(focus: &Option<T>, id: u32) -> bool {
    focus.as_ref().is_some_and(|current| current.id() == id)
}

/// Replace the focus when it holds the same ID
pub fn replace_focus<T: Resource>(focus: &mut Option<T>, updated: &T) -> bool {
    if focus_is(focus, updated.id()) {
        *focus = Some(updated.clone());
        true
    } else {
        false
    }
}

/// Clear the focus when it holds the given ID
pub fn clear_focus_if<T: Resource>(focus: &mut Option<T>, id: u32) -> bool {
    if focus_is(focus, id) {
        *focus = None;
        true
    } else {
        false
    }
}

/// Runs `finish` on drop, so a store's pending flag clears on every exit path
#[must_use = "dropping the guard ends the operation immediately"]
pub struct PendingGuard<F: FnOnce()> {
    finish: Option<F>,
}

impl<F: FnOnce()> PendingGuard<F> {
    pub fn new(finish: F) -> Self {
        Self { finish: Some(finish) }
    }
}

impl<F: FnOnce()> Drop for PendingGuard<F> {
    fn drop(&mut self) {
        if let Some(finish) = self.finish.take() {
            finish();
        }
    }
}
