//! Plain objects and enumerations.
//!
//! Objects are reference shapes whose fields travel sorted by name in
//! ascending byte order, regardless of declaration order. The sorted order is
//! computed on first use and cached per type.

use std::sync::OnceLock;

/// Lazily sorted field-name table, one per object type.
#[derive(Debug)]
pub struct FieldOrder {
    declared: &'static [&'static str],
    sorted: OnceLock<Vec<&'static str>>,
}

impl FieldOrder {
    pub const fn new(declared: &'static [&'static str]) -> Self {
        Self {
            declared,
            sorted: OnceLock::new(),
        }
    }

    /// Field names in wire order.
    pub fn names(&self) -> &[&'static str] {
        self.sorted.get_or_init(|| {
            let mut names = self.declared.to_vec();
            names.sort_unstable();
            names
        })
    }
}

/// Implement [`Payload`](crate::protocol::payload::Payload) for a plain struct.
///
/// List every field with its type; fields are encoded in ascending name
/// order, so the listing order does not matter.
///
/// ```
/// use dualcast_core::{payload_object, protocol::payload};
///
/// #[derive(Debug, PartialEq)]
/// struct Move {
///     y: f32,
///     x: f32,
/// }
///
/// payload_object!(Move { y: f32, x: f32 });
///
/// let bytes = payload::to_bytes(&Move { x: 1.0, y: 2.0 });
/// assert_eq!(bytes[0], 1); // presence
/// assert_eq!(&bytes[1..5], &1.0f32.to_le_bytes()); // `x` sorts first
/// ```
#[macro_export]
macro_rules! payload_object {
    ($ty:ident { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl $ty {
            #[doc(hidden)]
            fn __payload_field_order() -> &'static [&'static str] {
                static ORDER: $crate::protocol::payload::FieldOrder =
                    $crate::protocol::payload::FieldOrder::new(&[$(stringify!($field)),+]);
                ORDER.names()
            }
        }

        impl $crate::protocol::payload::Payload for $ty {
            const SHAPE: $crate::protocol::payload::Shape =
                $crate::protocol::payload::Shape::Reference;

            fn encode(&self, w: &mut $crate::protocol::payload::PayloadWriter) {
                for name in Self::__payload_field_order() {
                    $(
                        if *name == stringify!($field) {
                            $crate::protocol::payload::write(&self.$field, w);
                            continue;
                        }
                    )+
                }
            }

            fn decode(
                r: &mut $crate::protocol::payload::PayloadReader<'_>,
            ) -> $crate::Result<Self> {
                $( let mut $field: Option<$fty> = None; )+
                for name in Self::__payload_field_order() {
                    $(
                        if *name == stringify!($field) {
                            $field = Some($crate::protocol::payload::read(r)?);
                            continue;
                        }
                    )+
                }
                Ok(Self {
                    $(
                        $field: $field.ok_or_else(|| {
                            $crate::DualcastError::decode(concat!(
                                stringify!($ty), ": missing field ", stringify!($field)
                            ))
                        })?,
                    )+
                })
            }
        }
    };
}

/// Implement [`Payload`](crate::protocol::payload::Payload) for a fieldless
/// enum as its integer representation.
///
/// Unknown discriminants fail to decode.
#[macro_export]
macro_rules! payload_enum {
    ($ty:ident : $repr:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::protocol::payload::Payload for $ty {
            fn encode(&self, w: &mut $crate::protocol::payload::PayloadWriter) {
                let raw: $repr = match self {
                    $( $ty::$variant => $ty::$variant as $repr, )+
                };
                $crate::protocol::payload::write(&raw, w);
            }

            fn decode(
                r: &mut $crate::protocol::payload::PayloadReader<'_>,
            ) -> $crate::Result<Self> {
                let raw: $repr = $crate::protocol::payload::read(r)?;
                $(
                    if raw == $ty::$variant as $repr {
                        return Ok($ty::$variant);
                    }
                )+
                Err($crate::DualcastError::decode(format!(
                    "{}: unknown discriminant {}",
                    stringify!($ty),
                    raw
                )))
            }
        }
    };
}
