//! Static type descriptions.
//!
//! Rust has no runtime reflection over function signatures, so every bindable
//! type describes itself once through [`Bindable::descriptor`]. The binder
//! only ever reads these descriptions; it never builds or mutates them.
//!
//! [`Bindable::descriptor`]: crate::Bindable::descriptor

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::value::{Fields, Value};

/// The coarse category a converter is registered under.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KindTag {
    Int,
    Uint,
    Float,
    Bool,
    String,
    Slice,
    Struct,
    Pointer,
    Special,
}

/// Shape of a described type, with the nested descriptions composite kinds need.
#[derive(Clone, Debug)]
pub enum Kind {
    Int { bits: u32 },
    Uint { bits: u32 },
    Float { bits: u32 },
    Bool,
    String,
    Slice(Box<TypeDescriptor>),
    Struct(Arc<[Field]>),
    /// Nullable indirection (`Option<T>`).
    Pointer(Box<TypeDescriptor>),
    /// Anything only an exact-type converter knows how to build.
    Special,
}

impl Kind {
    pub fn tag(&self) -> KindTag {
        match self {
            Self::Int { .. }   => KindTag::Int,
            Self::Uint { .. }  => KindTag::Uint,
            Self::Float { .. } => KindTag::Float,
            Self::Bool         => KindTag::Bool,
            Self::String       => KindTag::String,
            Self::Slice(_)     => KindTag::Slice,
            Self::Struct(_)    => KindTag::Struct,
            Self::Pointer(_)   => KindTag::Pointer,
            Self::Special      => KindTag::Special,
        }
    }
}

/// Description of one Rust type: identity, display name and [`Kind`].
#[derive(Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    kind: Kind,
    zero: Option<fn() -> Value>,
}

impl TypeDescriptor {
    /// Describes `T` with the given kind.
    pub fn of<T: 'static>(kind: Kind) -> Self {
        Self { id: TypeId::of::<T>(), name: std::any::type_name::<T>(), kind, zero: None }
    }

    /// Describes a struct `T` from its fields, in declaration order.
    pub fn structure<T: 'static>(fields: Vec<Field>) -> Self {
        Self::of::<T>(Kind::Struct(fields.into()))
    }

    /// Describes a type that only an exact-type converter can bind.
    pub fn special<T: 'static>() -> Self {
        Self::of::<T>(Kind::Special)
    }

    /// Sets the zero value of a [`Kind::Special`] type. Without one, a
    /// special type's zero is [`Value::Null`].
    pub fn with_zero(mut self, zero: fn() -> Value) -> Self {
        self.zero = Some(zero);
        self
    }

    /// Whether [`zero`](Self::zero) yields a value `from_value` can accept.
    pub fn has_zero(&self) -> bool {
        !matches!(self.kind, Kind::Special) || self.zero.is_some()
    }

    pub fn id(&self) -> TypeId { self.id }
    pub fn name(&self) -> &'static str { self.name }
    pub fn kind(&self) -> &Kind { &self.kind }
    pub fn tag(&self) -> KindTag { self.kind.tag() }

    /// Strips every pointer layer: `Option<Option<T>>` resolves to `T`.
    pub fn resolved(&self) -> &TypeDescriptor {
        let mut ty = self;
        while let Kind::Pointer(inner) = &ty.kind {
            ty = inner;
        }
        ty
    }

    /// Fields of a struct type, empty for every other kind.
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            Kind::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// The value a converter falls back to when input is missing or invalid.
    pub fn zero(&self) -> Value {
        match &self.kind {
            Kind::Int { .. }   => Value::Int(0),
            Kind::Uint { .. }  => Value::Uint(0),
            Kind::Float { .. } => Value::Float(0.0),
            Kind::Bool         => Value::Bool(false),
            Kind::String       => Value::Str(String::new()),
            Kind::Slice(_)     => Value::Seq(Vec::new()),
            Kind::Struct(fields) => Value::Struct(
                fields.iter().map(|f| (f.name, f.ty.zero())).collect::<Fields>(),
            ),
            Kind::Pointer(_) => Value::Null,
            Kind::Special => self.zero.map_or(Value::Null, |zero| zero()),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One declared struct field.
#[derive(Clone, Debug)]
pub struct Field {
    pub(crate) name: &'static str,
    pub(crate) tag: &'static str,
    pub(crate) ty: TypeDescriptor,
}

impl Field {
    /// An untagged field. Untagged scalar fields are never bound.
    pub fn new(name: &'static str, ty: TypeDescriptor) -> Self {
        Self { name, tag: "", ty }
    }

    /// Names the request parameter this field binds from.
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    pub fn name(&self) -> &'static str { self.name }
    pub fn bind_tag(&self) -> &'static str { self.tag }
    pub fn ty(&self) -> &TypeDescriptor { &self.ty }
}
