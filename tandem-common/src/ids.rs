//! Room code and item identifier generation

use rand::Rng;
use uuid::Uuid;

/// Characters used for room codes (uppercase base36)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default room code length
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Longest slug prefix kept in an item id
const MAX_SLUG_LEN: usize = 32;

/// Generate a random room code of `len` characters
pub fn room_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user-typed room codes (`" ab12cd "` -> `"AB12CD"`)
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Lowercase, dash-separated slug of an item name
///
/// Non-alphanumeric runs collapse to a single dash. Empty input yields
/// `"item"` so ids never start with the salt separator.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut len = 0;
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if !ch.is_alphanumeric() {
            pending_dash = true;
            continue;
        }
        let dash = pending_dash && !slug.is_empty();
        let needed = if dash { 2 } else { 1 };
        if len + needed > MAX_SLUG_LEN {
            break;
        }
        if dash {
            slug.push('-');
        }
        slug.push(ch);
        len += needed;
        pending_dash = false;
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// Generate an item id: name slug plus a random salt
///
/// Salt is the first 8 hex digits of a UUIDv4, so ids from two participants
/// submitting the same name differ with overwhelming probability.
pub fn item_id(name: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}-{}", slugify(name), &salt[..8])
}

/// Generate an opaque participant token
pub fn participant_token() -> String {
    Uuid::new_v4().to_string()
}
