//! Struct attribute cache: which fields of a struct bind from which parameter.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::descriptor::{Kind, TypeDescriptor};

/// Parameter name meaning "bind from the whole parameter set".
pub const WILDCARD: &str = "*";

/// Where a struct field takes its value from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    /// A single request parameter, named by the field's `bind` tag.
    Named(&'static str),
    /// The full parameter set; used for nested struct fields.
    Wildcard,
}

impl Source {
    pub fn param_name(self) -> &'static str {
        match self {
            Self::Named(name) => name,
            Self::Wildcard => WILDCARD,
        }
    }
}

/// One bindable field: its position in the struct and its source.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub index: usize,
    pub field: &'static str,
    pub source: Source,
}

/// The bindable fields of one struct type, in declaration order.
#[derive(Debug, Default)]
pub struct StructAttributes {
    entries: Vec<Attribute>,
}

impl StructAttributes {
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    pub fn source(&self, field: &str) -> Option<Source> {
        self.entries.iter().find(|a| a.field == field).map(|a| a.source)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Process-lifetime cache keyed by the pointer-stripped struct type.
///
/// Populated at wrap time for wildcard parameters and lazily for structs met
/// during binding, hence the lock.
#[derive(Default)]
pub(crate) struct AttributeRegistry {
    map: RwLock<HashMap<TypeId, Arc<StructAttributes>>>,
}

impl AttributeRegistry {
    /// Registers `ty` and, recursively, every struct it contains directly.
    /// A no-op for non-struct types and for types already registered.
    ///
    /// Recursive struct containment is not detected.
    pub(crate) fn register(&self, ty: &TypeDescriptor) {
        let ty = ty.resolved();
        let Kind::Struct(fields) = ty.kind() else { return };
        if self.get(ty).is_some() {
            return;
        }

        let mut entries = Vec::new();
        for (index, field) in fields.iter().enumerate() {
            if field.ty.tag() == crate::KindTag::Struct {
                self.register(&field.ty);
                entries.push(Attribute { index, field: field.name, source: Source::Wildcard });
            } else if !field.tag.is_empty() {
                entries.push(Attribute { index, field: field.name, source: Source::Named(field.tag) });
            }
        }

        debug!(ty = ty.name(), bound = entries.len(), declared = fields.len(), "registered struct attributes");
        self.map.write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ty.id(), Arc::new(StructAttributes { entries }));
    }

    pub(crate) fn get(&self, ty: &TypeDescriptor) -> Option<Arc<StructAttributes>> {
        self.map.read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ty.resolved().id())
            .cloned()
    }

    pub(crate) fn get_or_register(&self, ty: &TypeDescriptor) -> Arc<StructAttributes> {
        if let Some(attrs) = self.get(ty) {
            return attrs;
        }
        self.register(ty);
        self.get(ty).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bindable;

    crate::bindable! {
        struct Window {
            #[bind("from")]
            from: u32,
            #[bind("to")]
            to: u32,
        }
    }

    crate::bindable! {
        struct Search {
            #[bind("q")]
            query: String,
            hidden: bool,
            window: Window,
            #[bind("ignored")]
            nested_tag_is_ignored: Window,
        }
    }

    #[test]
    fn tagged_and_nested_fields_are_recorded_untagged_are_not() {
        let registry = AttributeRegistry::default();
        registry.register(&Search::descriptor());

        let attrs = registry.get(&Search::descriptor()).unwrap();
        let recorded: Vec<_> = attrs.iter().map(|a| (a.index, a.field, a.source)).collect();
        assert_eq!(recorded, [
            (0, "query", Source::Named("q")),
            (2, "window", Source::Wildcard),
            (3, "nested_tag_is_ignored", Source::Wildcard),
        ]);
        assert_eq!(attrs.source("hidden"), None);
    }

    #[test]
    fn nested_structs_are_registered_recursively() {
        let registry = AttributeRegistry::default();
        registry.register(&Search::descriptor());

        let window = registry.get(&Window::descriptor()).unwrap();
        assert_eq!(window.source("from"), Some(Source::Named("from")));
        assert_eq!(window.source("to"), Some(Source::Named("to")));
    }

    #[test]
    fn pointer_types_resolve_to_their_struct() {
        let registry = AttributeRegistry::default();
        registry.register(&<Option<Window>>::descriptor());
        assert!(registry.get(&Window::descriptor()).is_some());
        assert!(registry.get(&<Option<Window>>::descriptor()).is_some());
    }

    #[test]
    fn non_structs_are_ignored() {
        let registry = AttributeRegistry::default();
        registry.register(&i64::descriptor());
        assert!(registry.get(&i64::descriptor()).is_none());
    }

    #[test]
    fn registration_is_idempotent() {
        let registry = AttributeRegistry::default();
        registry.register(&Window::descriptor());
        let first = registry.get(&Window::descriptor()).unwrap();
        registry.register(&Window::descriptor());
        let second = registry.get(&Window::descriptor()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
