//! Table-definition macros wiring borsh (values) and order-preserving
//! bincode (seek keys) into rockbound's codec traits.

/// Declares the schema type and its column family without committing to a
/// codec.
#[macro_export]
macro_rules! define_table_without_codec {
    ($(#[$docs:meta])+ ($table_name:ident) $key:ty => $value:ty) => {
        $(#[$docs])+
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $table_name;

        impl ::rockbound::schema::Schema for $table_name {
            const COLUMN_FAMILY_NAME: ::rockbound::schema::ColumnFamilyName =
                ::core::stringify!($table_name);
            type Key = $key;
            type Value = $value;
        }

        impl ::std::fmt::Display for $table_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::core::write!(f, "{}", ::core::stringify!($table_name))
            }
        }
    };
}

/// Borsh value codec for a declared table.
#[macro_export]
macro_rules! impl_borsh_value_codec {
    ($table_name:ident, $value:ty) => {
        impl ::rockbound::schema::ValueCodec<$table_name> for $value {
            fn encode_value(
                &self,
            ) -> ::std::result::Result<::std::vec::Vec<u8>, ::rockbound::CodecError> {
                ::borsh::to_vec(self).map_err(|e| ::rockbound::CodecError::Wrapped(e.into()))
            }

            fn decode_value(
                data: &[u8],
            ) -> ::std::result::Result<Self, ::rockbound::CodecError> {
                ::borsh::from_slice(data).map_err(|e| ::rockbound::CodecError::Wrapped(e.into()))
            }
        }
    };
}

/// Table with borsh codecs on both key and value.  Keys do not iterate in
/// a meaningful order.
#[macro_export]
macro_rules! define_table_with_default_codec {
    ($(#[$docs:meta])+ ($table_name:ident) $key:ty => $value:ty) => {
        $crate::define_table_without_codec!($(#[$docs])+ ($table_name) $key => $value);

        impl ::rockbound::schema::KeyEncoder<$table_name> for $key {
            fn encode_key(
                &self,
            ) -> ::std::result::Result<::std::vec::Vec<u8>, ::rockbound::CodecError> {
                ::borsh::to_vec(self).map_err(|e| ::rockbound::CodecError::Wrapped(e.into()))
            }
        }

        impl ::rockbound::schema::KeyDecoder<$table_name> for $key {
            fn decode_key(
                data: &[u8],
            ) -> ::std::result::Result<Self, ::rockbound::CodecError> {
                ::borsh::from_slice(data).map_err(|e| ::rockbound::CodecError::Wrapped(e.into()))
            }
        }

        $crate::impl_borsh_value_codec!($table_name, $value);
    };
}

/// Table whose keys encode big-endian so rocksdb iteration order matches
/// the natural key order.  Required wherever `get_last`/range walks are
/// used.
#[macro_export]
macro_rules! define_table_with_seek_key_codec {
    ($(#[$docs:meta])+ ($table_name:ident) $key:ty => $value:ty) => {
        $crate::define_table_without_codec!($(#[$docs])+ ($table_name) $key => $value);

        impl ::rockbound::schema::KeyEncoder<$table_name> for $key {
            fn encode_key(
                &self,
            ) -> ::std::result::Result<::std::vec::Vec<u8>, ::rockbound::CodecError> {
                use ::bincode::Options;

                let bincode_options = ::bincode::options()
                    .with_fixint_encoding()
                    .with_big_endian();

                bincode_options
                    .serialize(self)
                    .map_err(|e| ::rockbound::CodecError::Wrapped(e.into()))
            }
        }

        impl ::rockbound::schema::KeyDecoder<$table_name> for $key {
            fn decode_key(
                data: &[u8],
            ) -> ::std::result::Result<Self, ::rockbound::CodecError> {
                use ::bincode::Options;

                let bincode_options = ::bincode::options()
                    .with_fixint_encoding()
                    .with_big_endian();

                bincode_options
                    .deserialize(data)
                    .map_err(|e| ::rockbound::CodecError::Wrapped(e.into()))
            }
        }

        $crate::impl_borsh_value_codec!($table_name, $value);
    };
}
