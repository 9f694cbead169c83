use liquid_crypto::{Envelope, StoreKey};
use liquid_types::LiquidObject;

use crate::error::{StoreError, StoreResult};

/// Converts objects to sealed record bytes and back.
///
/// Record layout: JSON of the full [`LiquidObject`], sealed in an
/// [`Envelope`] whose associated data is the record name (the object id).
#[derive(Clone, Debug)]
pub struct ObjectCodec {
    key: StoreKey,
}

impl ObjectCodec {
    pub fn new(key: StoreKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    /// The record name for an object.
    pub fn record_name(object: &LiquidObject) -> String {
        object.id.to_string()
    }

    pub fn encode(&self, object: &LiquidObject) -> StoreResult<Vec<u8>> {
        let plaintext =
            serde_json::to_vec(object).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let envelope = Envelope::seal(&self.key, &Self::record_name(object), &plaintext)?;
        Ok(envelope.to_bytes()?)
    }

    /// Decode a record. Every failure is reported as [`StoreError::Decode`].
    pub fn decode(&self, record: &str, bytes: &[u8]) -> StoreResult<LiquidObject> {
        let decode_err = |reason: String| StoreError::Decode {
            record: record.to_string(),
            reason,
        };

        let envelope = Envelope::from_bytes(bytes).map_err(|e| decode_err(e.to_string()))?;
        let plaintext = envelope
            .open(&self.key, record)
            .map_err(|e| decode_err(e.to_string()))?;
        let object: LiquidObject =
            serde_json::from_slice(&plaintext).map_err(|e| decode_err(e.to_string()))?;

        if object.id.to_string() != record {
            return Err(decode_err(format!(
                "record holds object {}, not {record}",
                object.id
            )));
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquid_types::{MutationMeta, Properties, Value, DEFAULT_AUTHOR};

    fn sample() -> LiquidObject {
        let mut props = Properties::new();
        props.insert("title".into(), Value::from("Ship it"));
        props.insert("points".into(), Value::from(5));
        LiquidObject::new("task", props, &MutationMeta::new(), DEFAULT_AUTHOR)
    }

    #[test]
    fn encode_then_decode() {
        let codec = ObjectCodec::new(StoreKey::generate());
        let obj = sample();
        let bytes = codec.encode(&obj).unwrap();
        let name = ObjectCodec::record_name(&obj);
        assert_eq!(codec.decode(&name, &bytes).unwrap(), obj);
    }

    #[test]
    fn record_is_not_plaintext() {
        let codec = ObjectCodec::new(StoreKey::generate());
        let bytes = codec.encode(&sample()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("Ship it"));
    }

    #[test]
    fn wrong_key_is_decode_error() {
        let obj = sample();
        let bytes = ObjectCodec::new(StoreKey::generate()).encode(&obj).unwrap();
        let err = ObjectCodec::new(StoreKey::generate())
            .decode(&obj.id.to_string(), &bytes)
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn garbage_is_decode_error() {
        let codec = ObjectCodec::new(StoreKey::generate());
        let err = codec.decode("whatever", b"\x00\x01garbage").unwrap_err();
        assert!(matches!(err, StoreError::Decode { record, .. } if record == "whatever"));
    }

    #[test]
    fn record_under_wrong_name_is_rejected() {
        let codec = ObjectCodec::new(StoreKey::generate());
        let obj = sample();
        let other = sample();
        let bytes = codec.encode(&obj).unwrap();
        assert!(codec.decode(&other.id.to_string(), &bytes).is_err());
    }
}
