//! Bound values and the [`Bindable`] trait.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::{Kind, TypeDescriptor};
use crate::error::Error;

/// The dynamic result of running a converter.
///
/// A wrapped action never sees a `Value`: each argument type turns it back
/// into itself through [`Bindable::from_value`].
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Seq(Vec<Value>),
    Struct(Fields),
    Null,
    /// Produced by exact-type converters (the request, [`Params`](crate::Params), ...).
    Any(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_)    => "int",
            Self::Uint(_)   => "uint",
            Self::Float(_)  => "float",
            Self::Bool(_)   => "bool",
            Self::Str(_)    => "string",
            Self::Seq(_)    => "sequence",
            Self::Struct(_) => "struct",
            Self::Null      => "null",
            Self::Any(_)    => "opaque",
        }
    }

    /// Unwraps struct fields, failing with a mismatch for any other shape.
    pub fn into_fields<T>(self) -> Result<Fields, Error> {
        match self {
            Self::Struct(fields) => Ok(fields),
            other => Err(Error::mismatch::<T>(&other)),
        }
    }

    /// Downcasts an opaque value produced by an exact-type converter.
    pub fn downcast<T: Any + Send + Sync>(self) -> Result<Arc<T>, Error> {
        match self {
            Self::Any(any) => any.downcast::<T>().map_err(|_| Error::Mismatch {
                expected: std::any::type_name::<T>(),
                found: "opaque",
            }),
            other => Err(Error::mismatch::<T>(&other)),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n)    => write!(f, "Int({n})"),
            Self::Uint(n)   => write!(f, "Uint({n})"),
            Self::Float(n)  => write!(f, "Float({n})"),
            Self::Bool(b)   => write!(f, "Bool({b})"),
            Self::Str(s)    => write!(f, "Str({s:?})"),
            Self::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Self::Struct(fields) => f.debug_tuple("Struct").field(fields).finish(),
            Self::Null      => f.write_str("Null"),
            Self::Any(_)    => f.write_str("Any(..)"),
        }
    }
}

/// Opaque values compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b))       => a == b,
            (Self::Uint(a), Self::Uint(b))     => a == b,
            (Self::Float(a), Self::Float(b))   => a == b,
            (Self::Bool(a), Self::Bool(b))     => a == b,
            (Self::Str(a), Self::Str(b))       => a == b,
            (Self::Seq(a), Self::Seq(b))       => a == b,
            (Self::Struct(a), Self::Struct(b)) => a == b,
            (Self::Null, Self::Null)           => true,
            (Self::Any(a), Self::Any(b))       => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Struct field values in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields(Vec<(&'static str, Value)>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub(crate) fn set_at(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.0.get_mut(index) {
            slot.1 = value;
        }
    }

    /// Removes a field's value, leaving `Null` in its place.
    pub fn take(&mut self, name: &str) -> Value {
        self.0.iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| std::mem::replace(v, Value::Null))
            .unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<(&'static str, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (&'static str, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Bindable ──────────────────────────────────────────────────────────────────

/// A type that can appear as an argument of a wrapped action.
///
/// Implemented here for the integer and float primitives, `bool`, `String`,
/// `Vec<T>` and `Option<T>`. Structs get an implementation from
/// [`bindable!`](crate::bindable); the request and [`Params`](crate::Params)
/// implement it as special types backed by exact-type converters.
pub trait Bindable: Sized + Send + 'static {
    fn descriptor() -> TypeDescriptor;

    fn from_value(value: Value) -> Result<Self, Error>;
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl Bindable for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::of::<$ty>(Kind::Int { bits: <$ty>::BITS })
            }

            fn from_value(value: Value) -> Result<Self, Error> {
                match value {
                    Value::Int(n) => <$ty>::try_from(n).map_err(|_| Error::mismatch::<$ty>(&Value::Int(n))),
                    other => Err(Error::mismatch::<$ty>(&other)),
                }
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl Bindable for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::of::<$ty>(Kind::Uint { bits: <$ty>::BITS })
            }

            fn from_value(value: Value) -> Result<Self, Error> {
                match value {
                    Value::Uint(n) => <$ty>::try_from(n).map_err(|_| Error::mismatch::<$ty>(&Value::Uint(n))),
                    other => Err(Error::mismatch::<$ty>(&other)),
                }
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

impl Bindable for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<f32>(Kind::Float { bits: 32 })
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Float(n) => Ok(n as f32),
            other => Err(Error::mismatch::<f32>(&other)),
        }
    }
}

impl Bindable for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<f64>(Kind::Float { bits: 64 })
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Float(n) => Ok(n),
            other => Err(Error::mismatch::<f64>(&other)),
        }
    }
}

impl Bindable for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<bool>(Kind::Bool)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(Error::mismatch::<bool>(&other)),
        }
    }
}

impl Bindable for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<String>(Kind::String)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(Error::mismatch::<String>(&other)),
        }
    }
}

impl<T: Bindable> Bindable for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Vec<T>>(Kind::Slice(Box::new(T::descriptor())))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(Error::mismatch::<Vec<T>>(&other)),
        }
    }
}

impl<T: Bindable> Bindable for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Option<T>>(Kind::Pointer(Box::new(T::descriptor())))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Boxing is transparent: `Box<T>` binds exactly as `T` does.
impl<T: Bindable> Bindable for Box<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        T::from_value(value).map(Box::new)
    }
}
