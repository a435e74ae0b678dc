//! # astor-bind
//!
//! Typed parameter binding for HTTP handlers. Write an ordinary `async fn`,
//! name its parameters once, and get a request handler back.
//!
//! ## The contract
//!
//! The router finds the handler. The host serves the connection. astor-bind
//! does one thing in between: it turns query strings, path variables and
//! form bodies into the argument types an action declares, calls it, and
//! lets the result render itself.
//!
//! - **Converters** are looked up by exact type first, then by kind
//!   (integer, float, bool, string, `Vec<T>`, `Option<T>`, struct).
//! - **Missing or malformed values bind to zero**: `0`, `false`, `""`,
//!   an empty `Vec`, `None`. Actions never see a parse error.
//! - **Misconfiguration fails at wrap time**: too many parameter names is an
//!   [`Error`] from [`wrap`], and an action whose output is not [`Render`]
//!   does not compile.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use astor_bind::response::{Error, Json};
//! use astor_bind::{Binder, bindable, wrap};
//!
//! bindable! {
//!     pub struct Page {
//!         #[bind("page")]
//!         pub number: u32,
//!         #[bind("per_page")]
//!         pub size: Option<u32>,
//!     }
//! }
//!
//! async fn list_posts(author: String, tags: Vec<String>, page: Page) -> Result<Json<Vec<String>>, Error> {
//!     if author.is_empty() {
//!         return Err(Error::bad_request("author is required"));
//!     }
//!     let size = page.size.unwrap_or(20);
//!     Ok(Json::new(vec![format!("{author} {tags:?} page {} x {size}", page.number)]))
//! }
//!
//! // Registration happens before the binder is shared.
//! let binder = Arc::new(Binder::new());
//!
//! // `page` is unnamed, so it binds from the whole parameter set.
//! let handler = wrap(&binder, list_posts, ["author", "tags"]).expect("valid params");
//! # let _ = handler;
//! ```
//!
//! Serve `handler` through [`service`] with hyper, or call
//! [`Wrapped::call`] from your own router.

#[macro_use]
mod macros;

mod action;
mod binder;
mod config;
mod descriptor;
mod error;
mod handler;
mod request;
mod source;
mod value;
mod wrap;

pub mod response;

pub use action::Action;
pub use binder::{Attribute, BindContext, Binder, Bound, Converter, Source, StructAttributes, WILDCARD};
pub use binder::converters;
pub use config::{BindConfig, DEFAULT_MAX_BODY};
pub use descriptor::{Field, Kind, KindTag, TypeDescriptor};
pub use error::Error;
pub use handler::{Handler, HandlerService, service};
pub use request::Request;
pub use response::{Render, Response, ResponseWriter, StatusOverride};
pub use source::{Params, PathParams, QueryValues, RequestValues, SingleValue, ValueSource};
pub use value::{Bindable, Fields, Value};
pub use wrap::{Param, Wrapped, wrap, wrap_exact};
