//! Async functions whose arguments can be bound.
//!
//! An *action* is any `async fn` (or closure returning a future) whose
//! arguments are all [`Bindable`] and whose output is [`Render`]. The trait
//! is implemented for arities 0 through 8; the `Args` tuple only keeps the
//! implementations apart and never exists at runtime.

use std::future::Future;
use std::pin::Pin;

use crate::descriptor::TypeDescriptor;
use crate::error::Error;
use crate::response::Render;
use crate::value::{Bindable, Value};

/// A heap-allocated, type-erased future.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub trait Action<Args>: Send + Sync + 'static {
    type Output: Render + Send + 'static;

    /// One descriptor per declared argument, in order.
    fn descriptors() -> Vec<TypeDescriptor>;

    /// Recovers each typed argument from its bound value and starts the call.
    #[doc(hidden)]
    fn invoke(&self, args: Vec<Value>) -> Result<BoxFuture<Self::Output>, Error>;
}

macro_rules! impl_action {
    ($($arg:ident),*) => {
        impl<F, Fut, R, $($arg,)*> Action<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: Render + Send + 'static,
            $($arg: Bindable,)*
        {
            type Output = R;

            fn descriptors() -> Vec<TypeDescriptor> {
                vec![$(<$arg as Bindable>::descriptor()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, args: Vec<Value>) -> Result<BoxFuture<R>, Error> {
                let mut args = args.into_iter();
                $(
                    let $arg = <$arg as Bindable>::from_value(args.next().unwrap_or(Value::Null))?;
                )*
                Ok(Box::pin((self)($($arg),*)))
            }
        }
    };
}

impl_action!();
impl_action!(T1);
impl_action!(T1, T2);
impl_action!(T1, T2, T3);
impl_action!(T1, T2, T3, T4);
impl_action!(T1, T2, T3, T4, T5);
impl_action!(T1, T2, T3, T4, T5, T6);
impl_action!(T1, T2, T3, T4, T5, T6, T7);
impl_action!(T1, T2, T3, T4, T5, T6, T7, T8);
