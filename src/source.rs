//! Where raw parameter strings come from.
//!
//! A converter never reaches into the request directly: it asks a
//! [`ValueSource`] for a name. Sources are read-only, so the same request can
//! be bound concurrently and slice elements can be bound one at a time
//! through [`SingleValue`] without touching the request.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::descriptor::TypeDescriptor;
use crate::error::Error;
use crate::value::{Bindable, Value};

/// A read-only lookup of raw parameter values by name.
pub trait ValueSource {
    /// The first value recorded under `name`.
    fn value(&self, name: &str) -> Option<&str>;

    /// Every name/value pair, highest priority first.
    fn entries(&self) -> Vec<(&str, &str)>;
}

// ── QueryValues ───────────────────────────────────────────────────────────────

/// Decoded `application/x-www-form-urlencoded` pairs, in wire order.
///
/// Used for both the query string and form bodies.
#[derive(Clone, Debug, Default)]
pub struct QueryValues {
    pairs: Vec<(String, String)>,
}

impl QueryValues {
    pub fn parse(input: &[u8]) -> Self {
        Self { pairs: form_urlencoded::parse(input).into_owned().collect() }
    }

    /// Every value recorded under `name`.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

impl ValueSource for QueryValues {
    fn value(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

// ── PathParams ────────────────────────────────────────────────────────────────

/// Path variables captured by whatever router sits in front of the handler.
///
/// A router hands them over by inserting a `PathParams` into the
/// `http::Request` extensions before calling a wrapped handler.
#[derive(Clone, Debug, Default)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl ValueSource for PathParams {
    fn value(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

// ── RequestValues ─────────────────────────────────────────────────────────────

/// The layered view a wrapped handler binds from.
///
/// Lookup order: path variable, `:name` query key (when enabled), plain query
/// key, form body field (when present and enabled).
pub struct RequestValues<'a> {
    pub(crate) path: &'a PathParams,
    pub(crate) query: &'a QueryValues,
    pub(crate) form: Option<&'a QueryValues>,
    pub(crate) colon_params: bool,
}

impl ValueSource for RequestValues<'_> {
    fn value(&self, name: &str) -> Option<&str> {
        if let Some(v) = self.path.get(name) {
            return Some(v);
        }
        if self.colon_params {
            if let Some(v) = self.query.value(&format!(":{name}")) {
                return Some(v);
            }
        }
        self.query.value(name).or_else(|| self.form.and_then(|form| form.value(name)))
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        let mut out = self.path.entries();
        if self.colon_params {
            out.extend(
                self.query.entries().into_iter()
                    .filter_map(|(k, v)| k.strip_prefix(':').map(|k| (k, v))),
            );
        }
        out.extend(self.query.entries().into_iter().filter(|(k, _)| !self.colon_params || !k.starts_with(':')));
        if let Some(form) = self.form {
            out.extend(form.entries());
        }
        out
    }
}

// ── SingleValue ───────────────────────────────────────────────────────────────

/// One name bound to one value. Slice elements are bound through this.
pub struct SingleValue<'a> {
    name: &'a str,
    value: &'a str,
}

impl<'a> SingleValue<'a> {
    pub fn new(name: &'a str, value: &'a str) -> Self {
        Self { name, value }
    }
}

impl ValueSource for SingleValue<'_> {
    fn value(&self, name: &str) -> Option<&str> {
        (name == self.name).then_some(self.value)
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        vec![(self.name, self.value)]
    }
}

// ── Params ────────────────────────────────────────────────────────────────────

/// Every parameter available to a request, merged by priority.
///
/// Declare an action argument of this type to receive the whole parameter
/// set instead of a single named value. When a name appears in several
/// sources only the highest-priority value is kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Snapshots `source`, keeping the first value seen for each name.
    pub fn collect(source: &dyn ValueSource) -> Self {
        let entries = source.entries();
        let mut seen = HashSet::with_capacity(entries.len());
        let mut pairs = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            if seen.insert(k) {
                pairs.push((k.to_owned(), v.to_owned()));
            }
        }
        Self { pairs }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

impl Bindable for Params {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::special::<Params>().with_zero(|| Value::Any(Arc::new(Params::default())))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        if let Value::Null = value {
            return Ok(Params::default());
        }
        let params = value.downcast::<Params>()?;
        Ok(Arc::try_unwrap(params).unwrap_or_else(|shared| (*shared).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layered<'a>(path: &'a PathParams, query: &'a QueryValues, form: Option<&'a QueryValues>) -> RequestValues<'a> {
        RequestValues { path, query, form, colon_params: true }
    }

    #[test]
    fn query_values_decode_and_keep_first() {
        let q = QueryValues::parse(b"name=a%20b&tag=x&tag=y&plus=1+2");
        assert_eq!(q.value("name"), Some("a b"));
        assert_eq!(q.value("tag"), Some("x"));
        assert_eq!(q.all("tag").collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(q.value("plus"), Some("1 2"));
        assert_eq!(q.value("missing"), None);
    }

    #[test]
    fn path_outranks_colon_key_outranks_query_outranks_form() {
        let path: PathParams = [("id", "path")].into_iter().collect();
        let query = QueryValues::parse(b"id=query&:id=colon&:slug=colon&slug=query&page=2");
        let form = QueryValues::parse(b"page=9&extra=form");
        let values = layered(&path, &query, Some(&form));

        assert_eq!(values.value("id"), Some("path"));
        assert_eq!(values.value("slug"), Some("colon"));
        assert_eq!(values.value("page"), Some("2"));
        assert_eq!(values.value("extra"), Some("form"));
    }

    #[test]
    fn colon_keys_are_plain_when_disabled() {
        let path = PathParams::new();
        let query = QueryValues::parse(b":slug=colon&slug=query");
        let values = RequestValues { path: &path, query: &query, form: None, colon_params: false };
        assert_eq!(values.value("slug"), Some("query"));
        assert_eq!(values.value(":slug"), Some("colon"));
    }

    #[test]
    fn params_snapshot_keeps_highest_priority_value() {
        let path: PathParams = [("id", "7")].into_iter().collect();
        let query = QueryValues::parse(b"id=8&:name=colon&name=plain&q=rust");
        let params = Params::collect(&layered(&path, &query, None));

        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("name"), Some("colon"));
        assert_eq!(params.get("q"), Some("rust"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn params_snapshot_scales_with_many_distinct_names() {
        let raw: String = (0..20_000).map(|i| format!("k{i}={i}&")).collect();
        let query = QueryValues::parse(raw.as_bytes());
        let path = PathParams::new();
        let params = Params::collect(&layered(&path, &query, None));
        assert_eq!(params.len(), 20_000);
        assert_eq!(params.get("k19999"), Some("19999"));
        assert_eq!(params.iter().next(), Some(("k0", "0")));
    }

    #[test]
    fn params_zero_is_empty() {
        assert!(Params::from_value(Value::Null).unwrap().is_empty());
        assert!(Params::from_value(Params::descriptor().zero()).unwrap().is_empty());
    }

    #[test]
    fn single_value_answers_only_its_name() {
        let one = SingleValue::new("id", "3");
        assert_eq!(one.value("id"), Some("3"));
        assert_eq!(one.value("other"), None);
    }
}
