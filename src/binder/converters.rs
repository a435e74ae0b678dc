//! Default converters, one per kind, plus the request and parameter-set
//! converters registered by exact type.
//!
//! Empty and unparsable input are treated alike: both yield the type's zero
//! value flagged as absent.

use std::sync::Arc;

use crate::descriptor::{Kind, TypeDescriptor};
use crate::source::{Params, SingleValue};
use crate::value::Value;

use super::{BindContext, Bound};

pub fn int(cx: &BindContext<'_>, name: &str, ty: &TypeDescriptor) -> Bound {
    let bits = match ty.kind() {
        Kind::Int { bits } => *bits,
        _ => return Bound::absent(ty.zero()),
    };
    match cx.value(name).parse::<i64>() {
        Ok(n) if fits_signed(n, bits) => Bound::present(Value::Int(n)),
        _ => Bound::absent(ty.zero()),
    }
}

pub fn uint(cx: &BindContext<'_>, name: &str, ty: &TypeDescriptor) -> Bound {
    let bits = match ty.kind() {
        Kind::Uint { bits } => *bits,
        _ => return Bound::absent(ty.zero()),
    };
    match cx.value(name).parse::<u64>() {
        Ok(n) if bits >= 64 || n < 1u64 << bits => Bound::present(Value::Uint(n)),
        _ => Bound::absent(ty.zero()),
    }
}

pub fn float(cx: &BindContext<'_>, name: &str, ty: &TypeDescriptor) -> Bound {
    let raw = cx.value(name);
    let parsed = match ty.kind() {
        Kind::Float { bits: 32 } => raw.parse::<f32>().map(f64::from),
        Kind::Float { .. } => raw.parse::<f64>(),
        _ => return Bound::absent(ty.zero()),
    };
    match parsed {
        Ok(n) => Bound::present(Value::Float(n)),
        Err(_) => Bound::absent(ty.zero()),
    }
}

pub fn string(cx: &BindContext<'_>, name: &str, _ty: &TypeDescriptor) -> Bound {
    Bound::present(Value::Str(cx.value(name).to_owned()))
}

/// `yes`, `true`, `on` and `1` are true, ignoring case and surrounding
/// whitespace. Anything else, missing input included, is false.
pub fn boolean(cx: &BindContext<'_>, name: &str, _ty: &TypeDescriptor) -> Bound {
    let raw = cx.value(name).trim();
    let truthy = ["yes", "true", "on", "1"].iter().any(|t| raw.eq_ignore_ascii_case(t));
    Bound::present(Value::Bool(truthy))
}

/// Splits on the configured separator and binds each element on its own.
/// A bad element becomes the element zero value; only empty input makes the
/// whole slice absent.
pub fn slice(cx: &BindContext<'_>, name: &str, ty: &TypeDescriptor) -> Bound {
    let Kind::Slice(elem) = ty.kind() else { return Bound::absent(ty.zero()) };
    let raw = cx.value(name);
    if raw.is_empty() {
        return Bound::absent(ty.zero());
    }
    let items = raw
        .split(cx.binder().config().list_separator)
        .map(|item| {
            let single = SingleValue::new(name, item);
            cx.with_values(&single).bind(name, elem).value
        })
        .collect();
    Bound::present(Value::Seq(items))
}

/// Starts from the zero value and binds every registered field into it.
/// Never absent.
pub fn structure(cx: &BindContext<'_>, _name: &str, ty: &TypeDescriptor) -> Bound {
    let Value::Struct(mut fields) = ty.zero() else { return Bound::absent(ty.zero()) };
    let attrs = cx.binder().struct_attributes(ty);
    for attr in attrs.iter() {
        let Some(field) = ty.fields().get(attr.index) else { continue };
        let bound = cx.bind(attr.source.param_name(), &field.ty);
        fields.set_at(attr.index, bound.value);
    }
    Bound::present(Value::Struct(fields))
}

/// `Null` when the pointee is absent, the pointee itself otherwise.
pub fn pointer(cx: &BindContext<'_>, name: &str, ty: &TypeDescriptor) -> Bound {
    let Kind::Pointer(inner) = ty.kind() else { return Bound::absent(Value::Null) };
    let bound = cx.bind(name, inner);
    if bound.absent {
        Bound::absent(Value::Null)
    } else {
        Bound::present(bound.value)
    }
}

/// Binds the request being served. Absent outside of a request.
pub fn request(cx: &BindContext<'_>, _name: &str, _ty: &TypeDescriptor) -> Bound {
    match cx.request() {
        Some(req) => {
            let req: Arc<crate::Request> = Arc::clone(req);
            Bound::present(Value::Any(req))
        }
        None => Bound::absent(Value::Null),
    }
}

/// Binds a snapshot of every parameter the current source can see.
pub fn params(cx: &BindContext<'_>, _name: &str, _ty: &TypeDescriptor) -> Bound {
    Bound::present(Value::Any(Arc::new(Params::collect(cx.values()))))
}

fn fits_signed(n: i64, bits: u32) -> bool {
    if bits >= 64 {
        return true;
    }
    let limit = 1i64 << (bits - 1);
    (-limit..limit).contains(&n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::QueryValues;
    use crate::{Binder, Bindable};

    fn bind<T: Bindable>(query: &str, name: &str) -> Bound {
        let binder = Binder::new();
        let values = QueryValues::parse(query.as_bytes());
        BindContext::new(&binder, &values).bind(name, &T::descriptor())
    }

    fn typed<T: Bindable>(query: &str, name: &str) -> T {
        T::from_value(bind::<T>(query, name).value).unwrap()
    }

    #[test]
    fn missing_numbers_are_zero_and_absent() {
        assert_eq!(bind::<i64>("", "n"), Bound::absent(Value::Int(0)));
        assert_eq!(bind::<u32>("n=", "n"), Bound::absent(Value::Uint(0)));
        assert_eq!(bind::<f64>("other=1", "n"), Bound::absent(Value::Float(0.0)));
    }

    // Malformed input is indistinguishable from missing input.
    #[test]
    fn malformed_numbers_are_zero_and_absent() {
        assert_eq!(bind::<i32>("n=12abc", "n"), Bound::absent(Value::Int(0)));
        assert_eq!(bind::<u8>("n=-1", "n"), Bound::absent(Value::Uint(0)));
        assert_eq!(bind::<f32>("n=one", "n"), Bound::absent(Value::Float(0.0)));
    }

    #[test]
    fn numbers_outside_the_declared_width_are_absent() {
        assert_eq!(bind::<i8>("n=127", "n"), Bound::present(Value::Int(127)));
        assert_eq!(bind::<i8>("n=-128", "n"), Bound::present(Value::Int(-128)));
        assert_eq!(bind::<i8>("n=128", "n"), Bound::absent(Value::Int(0)));
        assert_eq!(bind::<u16>("n=65536", "n"), Bound::absent(Value::Uint(0)));
        assert_eq!(bind::<u64>("n=18446744073709551615", "n"), Bound::present(Value::Uint(u64::MAX)));
    }

    #[test]
    fn numbers_parse() {
        assert_eq!(typed::<i64>("n=-42", "n"), -42);
        assert_eq!(typed::<usize>("n=42", "n"), 42);
        assert_eq!(typed::<f64>("n=2.5", "n"), 2.5);
        assert_eq!(typed::<f32>("n=0.25", "n"), 0.25);
    }

    #[test]
    fn bool_recognises_truthy_words() {
        for raw in ["TRUE", "%20on%20", "1", "yes", "Yes"] {
            assert_eq!(bind::<bool>(&format!("b={raw}"), "b"), Bound::present(Value::Bool(true)), "{raw}");
        }
    }

    #[test]
    fn bool_is_false_otherwise_and_never_absent() {
        for raw in ["0", "false", "", "off", "y"] {
            assert_eq!(bind::<bool>(&format!("b={raw}"), "b"), Bound::present(Value::Bool(false)), "{raw}");
        }
        assert_eq!(bind::<bool>("", "b"), Bound::present(Value::Bool(false)));
    }

    #[test]
    fn string_passes_through_and_is_never_absent() {
        assert_eq!(bind::<String>("s=hello%20world", "s"), Bound::present(Value::Str("hello world".into())));
        assert_eq!(bind::<String>("", "s"), Bound::present(Value::Str(String::new())));
    }

    #[test]
    fn slice_splits_on_commas() {
        assert_eq!(typed::<Vec<String>>("l=a,b,c", "l"), ["a", "b", "c"]);
    }

    #[test]
    fn empty_slice_is_absent() {
        assert_eq!(bind::<Vec<String>>("l=", "l"), Bound::absent(Value::Seq(Vec::new())));
        assert_eq!(bind::<Vec<i64>>("", "l"), Bound::absent(Value::Seq(Vec::new())));
    }

    #[test]
    fn bad_slice_elements_degrade_to_zero() {
        let bound = bind::<Vec<i64>>("l=1,x,3", "l");
        assert!(!bound.absent);
        assert_eq!(<Vec<i64>>::from_value(bound.value).unwrap(), [1, 0, 3]);
    }

    #[test]
    fn slice_elements_do_not_see_colon_or_other_keys() {
        // Each element is bound through its own single-value source.
        assert_eq!(typed::<Vec<String>>("l=a,b&:l=z", "l"), ["a", "b"]);
    }

    #[test]
    fn slice_honours_configured_separator() {
        let binder = Binder::with_config(crate::BindConfig::default().list_separator(';'));
        let values = QueryValues::parse(b"l=1;2,3");
        let bound = BindContext::new(&binder, &values).bind("l", &<Vec<String>>::descriptor());
        assert_eq!(<Vec<String>>::from_value(bound.value).unwrap(), ["1", "2,3"]);
    }

    #[test]
    fn pointer_is_null_when_absent() {
        assert_eq!(bind::<Option<i64>>("", "n"), Bound::absent(Value::Null));
        assert_eq!(bind::<Option<i64>>("n=abc", "n"), Bound::absent(Value::Null));
        assert_eq!(typed::<Option<i64>>("n=5", "n"), Some(5));
    }

    #[test]
    fn pointer_to_bool_is_always_present() {
        assert_eq!(typed::<Option<bool>>("", "b"), Some(false));
    }

    #[test]
    fn request_is_absent_outside_a_request() {
        assert_eq!(bind::<Arc<crate::Request>>("", "*"), Bound::absent(Value::Null));
    }

    #[test]
    fn params_sees_the_whole_source() {
        let params = typed::<Params>("a=1&b=2&a=3", "*");
        assert_eq!(params.iter().collect::<Vec<_>>(), [("a", "1"), ("b", "2")]);
    }
}
