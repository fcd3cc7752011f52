//! Deterministic directive identity.
//!
//! `id = hex(md5(source ++ target))` with no separator, matching directives
//! already written by earlier tooling. The digest is order sensitive, so push
//! and pull of the same pair are distinct directives.

use md5::{Digest, Md5};

use crate::types::DirectiveId;

/// Derive the directive id for a final (post push/pull swap) source/target pair.
pub fn directive_id(source: &str, target: &str) -> DirectiveId {
    let mut h = Md5::new();
    h.update(source.as_bytes());
    h.update(target.as_bytes());
    DirectiveId(hex::encode(h.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn id_is_lowercase_hex_md5() {
        let id = directive_id("inventory", "https://remote.example/inventory");
        assert_eq!(id.0.len(), 32);
        assert!(id.0.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[rstest]
    #[case("", "", "d41d8cd98f00b204e9800998ecf8427e")]
    #[case(
        "inventory",
        "https://remote.example/inventory",
        "f61466455f37ea1fa5ec6f95981b5c11"
    )]
    #[case("a", "b", "187ef4436122d1cc2f40dc2b92f0eba0")]
    #[case("b", "a", "07159c47ee1b19ae4fb9c40d480856c4")]
    fn known_digests(#[case] source: &str, #[case] target: &str, #[case] expected: &str) {
        assert_eq!(directive_id(source, target).0, expected);
    }

    #[test]
    fn id_hashes_plain_concatenation() {
        assert_eq!(directive_id("inven", "tory"), directive_id("inventory", ""));
    }

    #[rstest]
    #[case("inventory", "https://remote.example/inventory")]
    #[case("a", "b")]
    #[case("orders", "http://admin:pw@10.0.0.2:5984/orders")]
    fn id_is_stable_and_order_sensitive(#[case] source: &str, #[case] target: &str) {
        let first = directive_id(source, target);
        assert_eq!(first, directive_id(source, target));
        assert_ne!(first, directive_id(target, source));
    }
}
