/// Declares a struct together with its [`Bindable`](crate::Bindable) implementation.
///
/// Tag a field with `#[bind("name")]` to bind it from the request parameter
/// `name`. Untagged scalar fields keep their zero value. A field whose type is
/// itself a struct is bound from the whole parameter set, tagged or not.
/// Doc comments and other attributes on fields pass through unchanged.
///
/// ```rust
/// astor_bind::bindable! {
///     #[derive(Debug, Default)]
///     pub struct Page {
///         #[bind("page")]
///         pub number: u32,
///         /// Defaults to the server's page size when absent.
///         #[bind("per_page")]
///         pub size: Option<u32>,
///         pub cursor: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! bindable {
    // `#[bind("tag")]` is consumed here and never reaches the struct.
    (@field $head:tt [$($done:tt)*] [$($attrs:tt)*] [$($tag:tt)*]
        #[bind($t:literal)] $($rest:tt)*
    ) => {
        $crate::bindable!(@field $head [$($done)*] [$($attrs)*] [$t] $($rest)*);
    };
    (@field $head:tt [$($done:tt)*] [$($attrs:tt)*] [$($tag:tt)*]
        #[$($attr:tt)*] $($rest:tt)*
    ) => {
        $crate::bindable!(@field $head [$($done)*] [$($attrs)* #[$($attr)*]] [$($tag)*] $($rest)*);
    };
    (@field $head:tt [$($done:tt)*] [$($attrs:tt)*] [$($tag:tt)*]
        $fvis:vis $field:ident : $fty:ty, $($rest:tt)*
    ) => {
        $crate::bindable!(@field $head
            [$($done)* { [$($attrs)*] [$($tag)*] [$fvis] $field [$fty] }] [] [] $($rest)*);
    };
    (@field $head:tt [$($done:tt)*] [$($attrs:tt)*] [$($tag:tt)*]
        $fvis:vis $field:ident : $fty:ty
    ) => {
        $crate::bindable!(@field $head
            [$($done)* { [$($attrs)*] [$($tag)*] [$fvis] $field [$fty] }] [] []);
    };
    (@field [[$($meta:tt)*] [$vis:vis] $name:ident]
        [$( { [$($fattr:tt)*] [$($tag:tt)*] [$fvis:vis] $field:ident [$fty:ty] } )*] [] []
    ) => {
        $($meta)*
        $vis struct $name {
            $( $($fattr)* $fvis $field: $fty, )*
        }

        impl $crate::Bindable for $name {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::structure::<Self>(::std::vec![
                    $(
                        $crate::Field::new(
                            ::core::stringify!($field),
                            <$fty as $crate::Bindable>::descriptor(),
                        )
                        $(.tag($tag))*
                    ),*
                ])
            }

            #[allow(unused_mut, unused_variables)]
            fn from_value(value: $crate::Value) -> ::core::result::Result<Self, $crate::Error> {
                let mut fields = value.into_fields::<Self>()?;
                ::core::result::Result::Ok(Self {
                    $(
                        $field: <$fty as $crate::Bindable>::from_value(
                            fields.take(::core::stringify!($field)),
                        )?,
                    )*
                })
            }
        }
    };
    (
        $(#[$($meta:tt)*])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::bindable!(@field [[$(#[$($meta)*])*] [$vis] $name] [] [] [] $($body)*);
    };
}

#[cfg(test)]
mod tests {
    use crate::{Bindable, KindTag, Value};

    crate::bindable! {
        #[derive(Debug, PartialEq)]
        struct Inner {
            #[bind("q")]
            query: String,
        }
    }

    crate::bindable! {
        #[derive(Debug, PartialEq)]
        struct Outer {
            #[bind("id")]
            id: i64,
            note: String,
            inner: Inner,
        }
    }

    crate::bindable! {
        /// Outer attributes and field docs survive expansion.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub(crate) struct Documented {
            /// Sort column.
            #[bind("sort")]
            #[allow(dead_code)]
            pub sort: String,
            #[allow(dead_code)]
            #[bind("desc")]
            desc: bool,
            /// Untagged.
            pub(crate) note: String
        }
    }

    #[test]
    fn field_attributes_pass_through_and_tags_are_kept() {
        let ty = Documented::descriptor();
        let tags: Vec<_> = ty.fields().iter().map(|f| f.bind_tag()).collect();
        assert_eq!(tags, ["sort", "desc", ""]);
        assert_eq!(Documented::default().clone(), Documented::default());
    }

    #[test]
    fn descriptor_lists_fields_in_declaration_order() {
        let ty = Outer::descriptor();
        let names: Vec<_> = ty.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["id", "note", "inner"]);
        assert_eq!(ty.fields()[0].bind_tag(), "id");
        assert_eq!(ty.fields()[1].bind_tag(), "");
        assert_eq!(ty.fields()[2].ty().tag(), KindTag::Struct);
    }

    #[test]
    fn from_value_rebuilds_nested_structs() {
        let Value::Struct(mut fields) = Outer::descriptor().zero() else { unreachable!() };
        fields.set_at(0, Value::Int(9));
        let outer = Outer::from_value(Value::Struct(fields)).unwrap();
        assert_eq!(outer, Outer { id: 9, note: String::new(), inner: Inner { query: String::new() } });
    }
}
