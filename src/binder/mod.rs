//! The dispatch registry.
//!
//! # Lookup order
//!
//! ```text
//! bind(name, ty)
//!   ├─ type_binders[ty.id()]     exact type, registered by the application
//!   ├─ kind_binders[ty.tag()]    one default per kind
//!   └─ ty.zero(), absent         nothing registered
//! ```
//!
//! Converters are plain functions over a [`BindContext`]; the composite ones
//! (slice, struct, pointer) recurse through [`BindContext::bind`], so an
//! exact-type override applies at every depth.
//!
//! Converter tables are only writable through `&mut Binder`. Once the binder
//! is wrapped in an `Arc` and handed to [`wrap`](crate::wrap) it is frozen,
//! which makes registration during live traffic impossible to express.

mod attributes;
pub mod converters;

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::config::BindConfig;
use crate::descriptor::{KindTag, TypeDescriptor};
use crate::request::Request;
use crate::source::{Params, ValueSource};
use crate::value::Value;

pub use attributes::{Attribute, Source, StructAttributes, WILDCARD};

use attributes::AttributeRegistry;

/// Outcome of one conversion.
///
/// `absent` means no usable input was found and `value` is the zero value.
/// Malformed input reports the same way as missing input.
#[derive(Clone, Debug, PartialEq)]
pub struct Bound {
    pub value: Value,
    pub absent: bool,
}

impl Bound {
    pub fn present(value: Value) -> Self {
        Self { value, absent: false }
    }

    pub fn absent(value: Value) -> Self {
        Self { value, absent: true }
    }
}

/// A converter: raw input under `name`, read through the context, to a value
/// shaped like `ty`.
pub type Converter = Arc<dyn Fn(&BindContext<'_>, &str, &TypeDescriptor) -> Bound + Send + Sync>;

// ── BindContext ───────────────────────────────────────────────────────────────

/// Everything a converter may read: the binder (for recursion), the value
/// source, and the request when one is being served.
pub struct BindContext<'a> {
    binder: &'a Binder,
    values: &'a dyn ValueSource,
    request: Option<&'a Arc<Request>>,
}

impl<'a> BindContext<'a> {
    pub fn new(binder: &'a Binder, values: &'a dyn ValueSource) -> Self {
        Self { binder, values, request: None }
    }

    pub fn with_request(mut self, request: &'a Arc<Request>) -> Self {
        self.request = Some(request);
        self
    }

    /// The same context reading from a different source.
    pub fn with_values<'b>(&'b self, values: &'b dyn ValueSource) -> BindContext<'b> {
        BindContext { binder: self.binder, values, request: self.request }
    }

    pub fn binder(&self) -> &'a Binder { self.binder }
    pub fn values(&self) -> &'a dyn ValueSource { self.values }
    pub fn request(&self) -> Option<&'a Arc<Request>> { self.request }

    /// The raw value under `name`, empty when there is none.
    pub fn value(&self, name: &str) -> &'a str {
        self.values.value(name).unwrap_or_default()
    }

    pub fn bind(&self, name: &str, ty: &TypeDescriptor) -> Bound {
        self.binder.bind(self, name, ty)
    }
}

// ── Binder ────────────────────────────────────────────────────────────────────

/// Exact-type and per-kind converter tables plus the struct attribute cache.
///
/// ```rust
/// use std::sync::Arc;
/// use astor_bind::{Bindable, Binder, Bound, Error, TypeDescriptor, Value};
///
/// struct Celsius(f64);
///
/// impl Bindable for Celsius {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::special::<Celsius>()
///     }
///
///     fn from_value(value: Value) -> Result<Self, Error> {
///         value.downcast::<f64>().map(|t| Celsius(*t))
///     }
/// }
///
/// let mut binder = Binder::new();
/// binder.register::<Celsius, _>(|cx, name, _ty| {
///     match cx.value(name).trim_end_matches('C').parse::<f64>() {
///         Ok(t) => Bound::present(Value::Any(Arc::new(t))),
///         Err(_) => Bound::absent(Value::Any(Arc::new(0.0_f64))),
///     }
/// });
/// let binder = Arc::new(binder);
/// # let _ = binder;
/// ```
pub struct Binder {
    type_binders: HashMap<TypeId, Converter>,
    kind_binders: HashMap<KindTag, Converter>,
    attributes: AttributeRegistry,
    config: BindConfig,
}

impl Binder {
    /// A binder with every default converter and the default config.
    pub fn new() -> Self {
        Self::with_config(BindConfig::default())
    }

    pub fn with_config(config: BindConfig) -> Self {
        let mut binder = Self::without_defaults(config);
        binder.register_kind(KindTag::Int, converters::int);
        binder.register_kind(KindTag::Uint, converters::uint);
        binder.register_kind(KindTag::Float, converters::float);
        binder.register_kind(KindTag::Bool, converters::boolean);
        binder.register_kind(KindTag::String, converters::string);
        binder.register_kind(KindTag::Slice, converters::slice);
        binder.register_kind(KindTag::Struct, converters::structure);
        binder.register_kind(KindTag::Pointer, converters::pointer);
        binder.register::<Arc<Request>, _>(converters::request);
        binder.register::<Params, _>(converters::params);
        binder
    }

    /// A binder with empty tables. Every bind yields a zero value until
    /// converters are registered.
    pub fn without_defaults(config: BindConfig) -> Self {
        Self {
            type_binders: HashMap::new(),
            kind_binders: HashMap::new(),
            attributes: AttributeRegistry::default(),
            config,
        }
    }

    /// Registers a converter for exactly `T`, taking precedence over the
    /// converter for `T`'s kind. Replaces any earlier registration for `T`.
    pub fn register<T, F>(&mut self, converter: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&BindContext<'_>, &str, &TypeDescriptor) -> Bound + Send + Sync + 'static,
    {
        self.type_binders.insert(TypeId::of::<T>(), Arc::new(converter));
        self
    }

    /// Registers the fallback converter for every type of kind `tag`.
    pub fn register_kind<F>(&mut self, tag: KindTag, converter: F) -> &mut Self
    where
        F: Fn(&BindContext<'_>, &str, &TypeDescriptor) -> Bound + Send + Sync + 'static,
    {
        self.kind_binders.insert(tag, Arc::new(converter));
        self
    }

    /// The converter `ty` dispatches to, exact type first.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Option<&Converter> {
        self.type_binders.get(&ty.id()).or_else(|| self.kind_binders.get(&ty.tag()))
    }

    /// Converts the input under `name` into a value shaped like `ty`.
    pub fn bind(&self, cx: &BindContext<'_>, name: &str, ty: &TypeDescriptor) -> Bound {
        let bound = match self.resolve(ty) {
            Some(converter) => converter(cx, name, ty),
            None => Bound::absent(ty.zero()),
        };
        trace!(param = name, ty = ty.name(), absent = bound.absent, "bound parameter");
        bound
    }

    /// [`bind`](Self::bind) without the absence flag.
    pub fn bound_value(&self, cx: &BindContext<'_>, name: &str, ty: &TypeDescriptor) -> Value {
        self.bind(cx, name, ty).value
    }

    /// Caches which fields of `ty` bind from where. Pointer layers are
    /// stripped; non-struct types are ignored; repeated calls are no-ops.
    pub fn register_struct(&self, ty: &TypeDescriptor) {
        self.attributes.register(ty);
    }

    /// Cached attributes for `ty`, without registering it.
    pub fn cached_attributes(&self, ty: &TypeDescriptor) -> Option<Arc<StructAttributes>> {
        self.attributes.get(ty)
    }

    /// Cached attributes for `ty`, registering it on first use.
    pub fn struct_attributes(&self, ty: &TypeDescriptor) -> Arc<StructAttributes> {
        self.attributes.get_or_register(ty)
    }

    pub fn config(&self) -> &BindConfig { &self.config }
}

impl Default for Binder {
    fn default() -> Self { Self::new() }
}
