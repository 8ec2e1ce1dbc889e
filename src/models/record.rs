//! The shape shared by every ServiceNow record type.
//!
//! Records are flat objects of optional string fields. A field that is
//! `None` is omitted from request bodies, so "absent" and "present but
//! empty" stay distinguishable on the wire.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A record type exposed through its own `.do` endpoint.
pub trait Record: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Endpoint relative to the base URL, without a leading `/`.
    const PATH: &'static str;

    /// Human-readable kind used in error messages ("incident").
    const KIND: &'static str;

    /// The record number (e.g. `INC0010001`).
    fn number(&self) -> Option<&str>;

    /// The record's unique `sys_id`.
    fn sys_id(&self) -> Option<&str>;
}

/// The `{"records": [...]}` envelope wrapping every JSONv2 response.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct Records<R> {
    /// Records returned by the server, possibly none. A `null` list is empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Vec<R>,
}

fn null_as_empty<'de, D, R>(deserializer: D) -> Result<Vec<R>, D::Error>
where
    D: Deserializer<'de>,
    R: Deserialize<'de>,
{
    Ok(Option::<Vec<R>>::deserialize(deserializer)?.unwrap_or_default())
}

impl<R> Default for Records<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Default> Records<R> {
    /// Returns the first record, or an empty record when there is none.
    pub fn into_first(self) -> R {
        self.records.into_iter().next().unwrap_or_default()
    }
}

/// Declares a record struct whose fields are all `Option<String>`.
///
/// A field may be renamed on the wire with `field => "wire_name"`. Fields the
/// server returns that are not declared land in `extra` and are sent back
/// unchanged. On serialization an `extra` entry replaces a declared field
/// with the same wire name, so every key appears once.
macro_rules! record {
    (@wire $field:ident) => {
        stringify!($field)
    };
    (@wire $field:ident $wire:literal) => {
        $wire
    };
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$field_meta:meta])* $field:ident $(=> $wire:literal)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Deserialize)]
        pub struct $name {
            $(
                #[doc = concat!("`", stringify!($field), "` field.")]
                $(#[$field_meta])*
                #[serde(default)]
                $( #[serde(rename = $wire)] )?
                pub $field: Option<String>,
            )*

            /// Fields not declared above, as returned by the server.
            #[serde(flatten)]
            pub extra: ::std::collections::BTreeMap<String, ::serde_json::Value>,
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                use ::serde::ser::SerializeMap;

                let mut map = serializer.serialize_map(None)?;
                $(
                    if let Some(value) = &self.$field {
                        let key = $crate::models::record::record!(@wire $field $($wire)?);
                        if !self.extra.contains_key(key) {
                            map.serialize_entry(key, value)?;
                        }
                    }
                )*
                for (key, value) in &self.extra {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    };
}

pub(crate) use record;
