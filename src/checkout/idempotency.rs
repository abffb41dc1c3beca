//! Idempotency key derivation
//!
//! Checkout deduplication does not rely on client-supplied request ids: the
//! key is a SHA-256 digest of the canonical serialization of the logical
//! request (both persons plus price). Identical submissions of the same
//! reading at the same price always produce the same key; any change to a
//! person field, the amount, or the currency produces a different one.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::reading::{Gender, PersonInput, ReadingInput};

/// Canonical person form used for hashing: names and birthplaces are
/// lower-cased so cosmetic case differences do not defeat deduplication,
/// everything else is hashed as-is. Field order is fixed by declaration.
#[derive(Serialize)]
struct CanonicalPerson<'a> {
    name: String,
    birthday: &'a str,
    birthtime: &'a str,
    birthtime_unknown: bool,
    gender: Gender,
    birthplace: String,
}

#[derive(Serialize)]
struct CanonicalInput<'a> {
    person_a: CanonicalPerson<'a>,
    person_b: CanonicalPerson<'a>,
}

fn canonical_person(person: &PersonInput) -> CanonicalPerson<'_> {
    CanonicalPerson {
        name: person.name.to_lowercase(),
        birthday: &person.birthday,
        birthtime: &person.birthtime,
        birthtime_unknown: person.birthtime_unknown,
        gender: person.gender,
        birthplace: person.birthplace.to_lowercase(),
    }
}

fn sha256_hex(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive the idempotency key for a checkout created from raw person data
pub fn checkout_idempotency_key(input: &ReadingInput, amount_cents: i64, currency: &str) -> String {
    let canonical = CanonicalInput {
        person_a: canonical_person(&input.person_a),
        person_b: canonical_person(&input.person_b),
    };
    // Serializing a struct of strings and bools cannot fail
    let serialized =
        serde_json::to_string(&canonical).expect("canonical input serialization cannot fail");
    sha256_hex(&format!("{serialized}|{amount_cents}|{currency}"))
}

/// Derive the idempotency key for a checkout against an existing reading
pub fn reading_idempotency_key(reading_id: &str, amount_cents: i64, currency: &str) -> String {
    sha256_hex(&format!("{reading_id}|{amount_cents}|{currency}"))
}
