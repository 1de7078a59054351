/// Declares concrete protocol objects.
///
/// Each declaration produces a struct deriving `Debug`, `Clone` and `PartialEq`,
/// a `TAG` constant, and the [`TdType`](crate::codec::TdType) and
/// [`WireField`](crate::codec::WireField) implementations. Fields whose wire name
/// is a Rust keyword are renamed with `as`:
///
/// ```ignore
/// td_object! {
///     /// A chat.
///     pub struct Chat: "chat" {
///         pub id: i64,
///         pub kind as "type": ChatType,
///         pub title: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! td_object {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $tag:literal {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident $(as $wire:literal)? : $fty:ty
            ),* $(,)?
        }
    )*) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $name {
            /// The `@type` of this object on the wire.
            pub const TAG: &'static str = $tag;
        }

        impl $crate::codec::TdType for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn has_tag(tag: &str) -> bool {
                tag == $tag
            }

            fn tag(&self) -> &'static str {
                $tag
            }

            #[allow(unused_variables)]
            fn decode_tagged(
                tag: &str,
                map: &mut $crate::codec::Map,
            ) -> ::std::result::Result<Self, $crate::codec::DecodeError> {
                ::std::result::Result::Ok($name {
                    $(
                        $field: $crate::codec::take_field(
                            map,
                            stringify!($name),
                            $crate::__wire_name!($field $(, $wire)?),
                        )?,
                    )*
                })
            }

            #[allow(unused_variables)]
            fn encode_into(&self, map: &mut $crate::codec::Map) {
                $(
                    $crate::codec::put_field(
                        map,
                        $crate::__wire_name!($field $(, $wire)?),
                        &self.$field,
                    );
                )*
            }
        }

        $crate::__wire_field_via_tdtype!($name);
    )*};
}

/// Declares closed unions of protocol objects.
///
/// Variants wrap either a concrete object or another union; decoding picks the
/// first variant whose type accepts the `@type`, so tags must not overlap
/// between variants. Every union also gets `From` conversions from its variant
/// types.
#[macro_export]
macro_rules! td_union {
    ($(
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($vty:ty)
            ),+ $(,)?
        }
    )*) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($vty),
            )+
        }

        impl $crate::codec::TdType for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn has_tag(tag: &str) -> bool {
                $( <$vty as $crate::codec::TdType>::has_tag(tag) )||+
            }

            fn tag(&self) -> &'static str {
                match self {
                    $( $name::$variant(inner) => $crate::codec::TdType::tag(inner), )+
                }
            }

            fn decode_tagged(
                tag: &str,
                map: &mut $crate::codec::Map,
            ) -> ::std::result::Result<Self, $crate::codec::DecodeError> {
                $(
                    if <$vty as $crate::codec::TdType>::has_tag(tag) {
                        return <$vty as $crate::codec::TdType>::decode_tagged(tag, map)
                            .map($name::$variant);
                    }
                )+
                ::std::result::Result::Err($crate::codec::DecodeError::UnknownTag {
                    tag: tag.to_owned(),
                    expected: stringify!($name),
                })
            }

            fn encode_into(&self, map: &mut $crate::codec::Map) {
                match self {
                    $( $name::$variant(inner) => $crate::codec::TdType::encode_into(inner, map), )+
                }
            }
        }

        $crate::__wire_field_via_tdtype!($name);

        $(
            impl ::std::convert::From<$vty> for $name {
                fn from(value: $vty) -> Self {
                    $name::$variant(value)
                }
            }
        )+
    )*};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $wire:literal) => {
        $wire
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_field_via_tdtype {
    ($name:ident) => {
        impl $crate::codec::WireField for $name {
            fn from_slot(
                slot: ::std::option::Option<$crate::codec::Value>,
                ctx: $crate::codec::FieldCtx,
            ) -> ::std::result::Result<Self, $crate::codec::DecodeError> {
                $crate::codec::object_from_slot(slot, ctx)
            }

            fn to_slot(&self) -> ::std::option::Option<$crate::codec::Value> {
                ::std::option::Option::Some($crate::codec::encode(self))
            }
        }
    };
}
