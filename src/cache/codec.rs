//! Value codec between application types and the stored JSON payload.
//!
//! Round-trip identity holds for every shape serde_json supports:
//! `decode(encode(v)) == v`. The engine never inspects the payload.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Encode a value to its canonical JSON payload.
///
/// Fails with `Error::Encode` when the value contains members serde_json
/// cannot represent (non-string map keys, for example), carrying the
/// offending key.
pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|source| Error::Encode { key: key.to_owned(), source })
}

/// Decode a stored payload into the requested shape.
///
/// Fails with `Error::Decode` when the payload does not structurally match
/// the target type.
pub fn decode<T: DeserializeOwned>(key: &str, payload: &str) -> Result<T, Error> {
    serde_json::from_str(payload).map_err(|source| Error::Decode { key: key.to_owned(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user_id: u64,
        name: String,
        roles: Vec<String>,
        last_seen: Option<i64>,
    }

    fn sample_session() -> Session {
        Session {
            user_id: 42,
            name: "dev".into(),
            roles: vec!["admin".into(), "reader".into()],
            last_seen: Some(1_700_000_000),
        }
    }

    #[test]
    fn test_roundtrip_struct() {
        let session = sample_session();
        let payload = encode("session:42", &session).unwrap();
        let back: Session = decode("session:42", &payload).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_roundtrip_scalars_and_collections() {
        let payload = encode("k", &"plain string").unwrap();
        assert_eq!(decode::<String>("k", &payload).unwrap(), "plain string");

        let payload = encode("k", &1234_i64).unwrap();
        assert_eq!(decode::<i64>("k", &payload).unwrap(), 1234);

        let map: HashMap<String, u32> = [("a".to_string(), 1), ("b".to_string(), 2)].into();
        let payload = encode("k", &map).unwrap();
        assert_eq!(decode::<HashMap<String, u32>>("k", &payload).unwrap(), map);
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let payload = encode("user:7", &sample_session()).unwrap();
        let result = decode::<Vec<u64>>("user:7", &payload);
        assert!(matches!(result, Err(Error::Decode { key, .. }) if key == "user:7"));
    }

    #[test]
    fn test_encode_unsupported_map_key() {
        let map: HashMap<(u8, u8), u8> = [((1, 2), 3)].into();
        let result = encode("bad", &map);
        assert!(matches!(result, Err(Error::Encode { key, .. }) if key == "bad"));
    }
}
