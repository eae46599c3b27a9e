//! Identifier generation

use bech32::Bech32m;
use uuid7::uuid7;

/// A fresh uuid7 encoded as bech32m under `hrp`, e.g. `req_1...` or `user_1...`.
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = new_uuid_to_bech32("req_").unwrap();
        let b = new_uuid_to_bech32("req_").unwrap();

        assert!(a.starts_with("req_1"));
        assert_ne!(a, b);
        assert!(new_uuid_to_bech32("").is_err());
    }
}
