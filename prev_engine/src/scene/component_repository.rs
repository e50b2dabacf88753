/// ComponentRepository: per-node registry of component capabilities.
///
/// A capability is a marker type, normally a trait-object type such as
/// `dyn TransformComponent`, registered with `declare_capability!`. The
/// repository maps each capability to an ordered list of shared handles.
/// Insertion order is preserved so "first" retrieval is deterministic.
///
/// Two strictness tiers:
/// - `get`, `get_all`, `remove` fail with `ComponentNotFound` when nothing is
///   registered (the caller states an invariant)
/// - `find_one`, `find_all`, `contains` return an empty result (the
///   capability is optional)

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_bail;

/// Shared component handle
///
/// Several subsystems may hold the same component; removing it from its
/// repository does not invalidate other holders.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wrap a concrete component in a shared handle
pub fn shared<T>(component: T) -> Shared<T> {
    Rc::new(RefCell::new(component))
}

/// A component capability with a stable diagnostic label
pub trait Capability: 'static {
    /// Human-readable name used in errors and logs
    const LABEL: &'static str;
}

/// Register a capability marker type and its label
///
/// ```ignore
/// pub trait LightComponent { /* ... */ }
/// declare_capability!(dyn LightComponent, "LightComponent");
/// ```
#[macro_export]
macro_rules! declare_capability {
    ($capability:ty, $label:expr) => {
        impl $crate::prev::scene::Capability for $capability {
            const LABEL: &'static str = $label;
        }
    };
}

struct CapabilityEntries {
    label: &'static str,
    /// `Vec<Shared<C>>` for the capability keyed by this entry
    handles: Box<dyn Any>,
    count: usize,
}

/// Type-indexed component storage owned by exactly one scene node
pub struct ComponentRepository {
    owner: String,
    entries: FxHashMap<TypeId, CapabilityEntries>,
    /// Capabilities in first-registration order
    order: Vec<TypeId>,
}

impl ComponentRepository {
    /// Create an empty repository
    ///
    /// `owner` describes the owning node in diagnostics (e.g. "node #4").
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            entries: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Description of the owning node
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Append a handle under capability `C`
    ///
    /// No duplicate check: the same concrete instance may be registered under
    /// several capabilities, or several times under one.
    pub fn add<C: Capability + ?Sized>(&mut self, handle: Shared<C>) {
        let type_id = TypeId::of::<C>();
        let entry = self.entries.entry(type_id).or_insert_with(|| CapabilityEntries {
            label: C::LABEL,
            handles: Box::new(Vec::<Shared<C>>::new()),
            count: 0,
        });
        if let Some(handles) = entry.handles.downcast_mut::<Vec<Shared<C>>>() {
            handles.push(handle);
            entry.count = handles.len();
        }
        if !self.order.contains(&type_id) {
            self.order.push(type_id);
        }
    }

    /// First handle registered under `C`
    ///
    /// # Errors
    ///
    /// `ComponentNotFound` if nothing is registered under `C`.
    pub fn get<C: Capability + ?Sized>(&self) -> Result<Shared<C>> {
        match self.find_one::<C>() {
            Some(handle) => Ok(handle),
            None => engine_bail!("prev::ComponentRepository", @ComponentNotFound,
                "{} is not registered on {}", C::LABEL, self.owner),
        }
    }

    /// Every handle registered under `C`, in insertion order
    ///
    /// # Errors
    ///
    /// `ComponentNotFound` if nothing is registered under `C`.
    pub fn get_all<C: Capability + ?Sized>(&self) -> Result<Vec<Shared<C>>> {
        match self.handles::<C>() {
            Some(handles) if !handles.is_empty() => Ok(handles.clone()),
            _ => engine_bail!("prev::ComponentRepository", @ComponentNotFound,
                "{} is not registered on {}", C::LABEL, self.owner),
        }
    }

    /// First handle registered under `C`, if any
    pub fn find_one<C: Capability + ?Sized>(&self) -> Option<Shared<C>> {
        self.handles::<C>().and_then(|handles| handles.first().cloned())
    }

    /// Every handle registered under `C` (possibly empty)
    pub fn find_all<C: Capability + ?Sized>(&self) -> Vec<Shared<C>> {
        self.handles::<C>().cloned().unwrap_or_default()
    }

    /// Erase every handle registered under `C` and return them
    ///
    /// # Errors
    ///
    /// `ComponentNotFound` if nothing is registered under `C`.
    pub fn remove<C: Capability + ?Sized>(&mut self) -> Result<Vec<Shared<C>>> {
        let type_id = TypeId::of::<C>();
        let removed = self.entries
            .remove(&type_id)
            .and_then(|entry| entry.handles.downcast::<Vec<Shared<C>>>().ok());

        match removed {
            Some(handles) => {
                self.order.retain(|id| *id != type_id);
                Ok(*handles)
            }
            None => engine_bail!("prev::ComponentRepository", @ComponentNotFound,
                "cannot remove {}: not registered on {}", C::LABEL, self.owner),
        }
    }

    /// Whether anything is registered under `C`
    pub fn contains<C: Capability + ?Sized>(&self) -> bool {
        self.handles::<C>().map_or(false, |handles| !handles.is_empty())
    }

    /// Number of handles registered under `C`
    pub fn count<C: Capability + ?Sized>(&self) -> usize {
        self.entries
            .get(&TypeId::of::<C>())
            .map_or(0, |entry| entry.count)
    }

    /// Labels of every registered capability, in first-registration order
    pub fn capability_labels(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| entry.label))
            .collect()
    }

    /// Total number of registrations across all capabilities
    pub fn len(&self) -> usize {
        self.entries.values().map(|entry| entry.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every registration
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn handles<C: Capability + ?Sized>(&self) -> Option<&Vec<Shared<C>>> {
        self.entries
            .get(&TypeId::of::<C>())
            .and_then(|entry| entry.handles.downcast_ref::<Vec<Shared<C>>>())
    }
}

impl Drop for ComponentRepository {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            crate::engine_warn!("prev::ComponentRepository",
                "{} dropped with {} live registration(s): {}",
                self.owner, self.len(), self.capability_labels().join(", "));
        }
    }
}

#[cfg(test)]
#[path = "component_repository_tests.rs"]
mod tests;
