//! Proptest generators for property-based testing.

use proptest::prelude::*;

use natmsg_core::{DateYmd, HashAlgorithm, KeyFunction, OwnerMetadata, Sexp};

/// Generate an arbitrary atom, including binary and empty ones.
pub fn atom() -> impl Strategy<Value = Sexp> {
    prop::collection::vec(any::<u8>(), 0..32).prop_map(Sexp::Atom)
}

/// Generate an arbitrary record tree of bounded depth.
pub fn sexp() -> impl Strategy<Value = Sexp> {
    atom().prop_recursive(4, 48, 8, |inner| {
        prop::collection::vec(inner, 0..8).prop_map(Sexp::List)
    })
}

/// Generate a key function.
pub fn key_function() -> impl Strategy<Value = KeyFunction> {
    prop_oneof![Just(KeyFunction::Encrypt), Just(KeyFunction::Sign)]
}

/// Generate a hash algorithm.
pub fn hash_algorithm() -> impl Strategy<Value = HashAlgorithm> {
    prop_oneof![
        Just(HashAlgorithm::Sha384),
        Just(HashAlgorithm::Sha512),
        Just(HashAlgorithm::Blake3),
    ]
}

/// Generate a valid 8-digit date.
pub fn date_ymd() -> impl Strategy<Value = DateYmd> {
    (1970u32..=9999, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        DateYmd::parse(&format!("{y:04}{m:02}{d:02}")).expect("generated date is valid")
    })
}

/// Generate an owner name.
pub fn owner_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 .-]{0,31}".prop_map(String::from)
}

/// Generate complete owner metadata with the key function set.
pub fn owner_metadata() -> impl Strategy<Value = OwnerMetadata> {
    (
        owner_name(),
        "[ -~]{0,48}",
        key_function(),
        prop::option::of("[A-Z0-9-]{1,16}"),
        prop::option::of("[0-9.]{7,15}"),
        prop::option::of(date_ymd()),
    )
        .prop_map(|(name, comment, function, id, ipv4, expire)| {
            let mut builder = OwnerMetadata::builder(name)
                .comment(comment)
                .key_function(function);
            if let Some(id) = id {
                builder = builder.natural_message_id(id);
            }
            if let Some(addr) = ipv4 {
                builder = builder.ipv4(addr);
            }
            if let Some(date) = expire {
                builder = builder.expire_date(date);
            }
            builder.build()
        })
}

/// Generate message payload bytes.
pub fn message(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}
