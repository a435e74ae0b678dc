//! Wrapping actions into request handlers.
//!
//! ```rust
//! use std::sync::Arc;
//! use astor_bind::response::Json;
//! use astor_bind::{Binder, wrap};
//!
//! async fn show(id: u64, verbose: bool) -> Json<serde_json::Value> {
//!     Json::new(serde_json::json!({ "id": id, "verbose": verbose }))
//! }
//!
//! let binder = Arc::new(Binder::new());
//! let handler = wrap(&binder, show, ["id", "verbose"]).expect("show takes two params");
//! # let _ = handler;
//! ```

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, error};

use crate::action::{Action, BoxFuture};
use crate::binder::{BindContext, Binder, WILDCARD};
use crate::descriptor::{Kind, TypeDescriptor};
use crate::error::Error;
use crate::request::Request;
use crate::response::{Render, Response};
use crate::value::Value;

/// One declared argument of a wrapped action.
#[derive(Clone, Debug)]
pub struct Param {
    name: String,
    ty: TypeDescriptor,
}

impl Param {
    pub fn name(&self) -> &str { &self.name }
    pub fn ty(&self) -> &TypeDescriptor { &self.ty }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}

/// Wraps `action`, binding its leading arguments from `names`.
///
/// Fewer names than arguments is fine: every unnamed trailing argument is
/// bound from the whole parameter set (the `"*"` wildcard), which suits
/// struct, [`Params`](crate::Params) and `Arc<Request>` arguments.
///
/// # Errors
///
/// [`Error::Arity`] if more names than arguments are given,
/// [`Error::NoConverter`] or [`Error::NoZero`] if an argument type cannot be
/// bound with the converters `binder` holds.
pub fn wrap<F, Args, N>(binder: &Arc<Binder>, action: F, names: N) -> Result<Wrapped, Error>
where
    F: Action<Args>,
    Args: 'static,
    N: IntoIterator,
    N::Item: Into<String>,
{
    Wrapped::build(binder, action, names, false)
}

/// Like [`wrap`], but every argument must be named.
///
/// # Errors
///
/// [`Error::Arity`] unless exactly one name per argument is given, and the
/// same binding errors as [`wrap`].
pub fn wrap_exact<F, Args, N>(binder: &Arc<Binder>, action: F, names: N) -> Result<Wrapped, Error>
where
    F: Action<Args>,
    Args: 'static,
    N: IntoIterator,
    N::Item: Into<String>,
{
    Wrapped::build(binder, action, names, true)
}

/// Rejects types that would fail on every request: special types without a
/// converter, and untagged struct fields with no zero value.
fn check_bindable(binder: &Binder, ty: &TypeDescriptor) -> Result<(), Error> {
    match ty.kind() {
        Kind::Special if binder.resolve(ty).is_none() && !ty.has_zero() => {
            Err(Error::NoConverter { ty: ty.name() })
        }
        Kind::Slice(elem) => check_bindable(binder, elem),
        // An absent pointee is `None`; only a struct behind the pointer is always built.
        Kind::Pointer(_) if matches!(ty.resolved().kind(), Kind::Struct(_)) => {
            check_bindable(binder, ty.resolved())
        }
        Kind::Struct(fields) => fields.iter().try_for_each(|field| {
            let nested = matches!(field.ty().resolved().kind(), Kind::Struct(_));
            if !field.bind_tag().is_empty() || nested {
                check_bindable(binder, field.ty())
            } else if field.ty().has_zero() {
                Ok(())
            } else {
                Err(Error::NoZero { owner: ty.name(), field: field.name() })
            }
        }),
        _ => Ok(()),
    }
}

// ── Type erasure ──────────────────────────────────────────────────────────────

trait ErasedAction: Send + Sync {
    fn invoke(&self, args: Vec<Value>) -> Result<BoxFuture<Response>, Error>;
}

/// `fn() -> Args` keeps the wrapper `Send + Sync` whatever `Args` is.
struct Erased<F, Args>(F, PhantomData<fn() -> Args>);

impl<F, Args> ErasedAction for Erased<F, Args>
where
    F: Action<Args>,
    Args: 'static,
{
    fn invoke(&self, args: Vec<Value>) -> Result<BoxFuture<Response>, Error> {
        let fut = self.0.invoke(args)?;
        Ok(Box::pin(async move { fut.await.into_response() }))
    }
}

// ── Wrapped ───────────────────────────────────────────────────────────────────

/// A wrapped action, ready to serve requests.
///
/// Cheap to clone; clones share the action, the parameter table and the binder.
#[derive(Clone)]
pub struct Wrapped {
    action: Arc<dyn ErasedAction>,
    params: Arc<[Param]>,
    binder: Arc<Binder>,
}

impl Wrapped {
    fn build<F, Args, N>(binder: &Arc<Binder>, action: F, names: N, exact: bool) -> Result<Self, Error>
    where
        F: Action<Args>,
        Args: 'static,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let types = F::descriptors();
        let mut names = names.into_iter().map(Into::into).collect::<Vec<String>>().into_iter();
        let given = names.len();
        if given > types.len() || (exact && given != types.len()) {
            error!(action = type_name::<F>(), expected = types.len(), given, "wrong number of params");
            return Err(Error::Arity { expected: types.len(), given, exact });
        }

        let params: Arc<[Param]> = types
            .into_iter()
            .map(|ty| Param { name: names.next().unwrap_or_else(|| WILDCARD.to_owned()), ty })
            .collect();

        for param in params.iter() {
            if let Err(e) = check_bindable(binder, &param.ty) {
                error!(action = type_name::<F>(), param = param.name(), error = %e, "unbindable param");
                return Err(e);
            }
        }

        // Struct attributes for wildcard params are cached now, not on first request.
        for param in params.iter().filter(|p| p.is_wildcard()) {
            binder.register_struct(&param.ty);
        }

        debug!(action = type_name::<F>(), params = ?params, "wrapped action");
        Ok(Self {
            action: Arc::new(Erased(action, PhantomData)),
            params,
            binder: Arc::clone(binder),
        })
    }

    pub fn params(&self) -> &[Param] { &self.params }
    pub fn binder(&self) -> &Arc<Binder> { &self.binder }

    /// Binds one value per declared parameter against `req`.
    pub fn bind_args(&self, req: &Arc<Request>) -> Vec<Value> {
        let values = req.values(self.binder.config());
        let cx = BindContext::new(&self.binder, &values).with_request(req);
        self.params.iter().map(|p| cx.bind(&p.name, &p.ty).value).collect()
    }

    /// Binds the arguments, runs the action and renders its result.
    pub fn call(&self, req: Request) -> BoxFuture<Response> {
        let req = Arc::new(req);
        let args = self.bind_args(&req);
        match self.action.invoke(args) {
            Ok(fut) => fut,
            Err(e) => {
                error!(path = req.path(), error = %e, "could not build action arguments");
                Box::pin(async move { e.into_response() })
            }
        }
    }
}
