use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::MethodAddress;
use crate::error::{CodecError, Result};

/// Wire-level request: which method to call and its encoded argument.
///
/// Field names are fixed by the wire format (`ServiceName`, `MethodName`,
/// `Args`). Missing fields decode to empty values; the dispatcher rejects
/// empty names and empty arguments explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Envelope {
    pub service_name: String,
    pub method_name: String,
    /// JSON encoding of the request value; a base64 string on the wire.
    #[serde(with = "base64_args")]
    pub args: Bytes,
}

impl Envelope {
    /// Assemble an envelope from already-encoded argument bytes.
    pub fn new(
        service_name: impl Into<String>,
        method_name: impl Into<String>,
        args: impl Into<Bytes>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            method_name: method_name.into(),
            args: args.into(),
        }
    }

    /// Parse `method_address` and serialize `value` as the argument payload.
    pub fn for_call<T: Serialize + ?Sized>(method_address: &str, value: &T) -> Result<Self> {
        let address = MethodAddress::parse(method_address)?;
        Self::for_address(&address, value)
    }

    /// Serialize `value` as the argument payload for a parsed address.
    pub fn for_address<T: Serialize + ?Sized>(address: &MethodAddress, value: &T) -> Result<Self> {
        let args = serde_json::to_vec(value).map_err(CodecError::Serialize)?;
        Ok(Self::new(address.service(), address.method(), args))
    }

    /// Decode the argument payload into a concrete request type.
    pub fn decode_args<T: DeserializeOwned>(&self) -> Result<T> {
        decode_args(&self.args)
    }

    /// The `"<service>.<method>"` form of this envelope's target.
    pub fn method_address(&self) -> String {
        format!("{}.{}", self.service_name, self.method_name)
    }
}

// `Args` travels as standard base64, the way Go's encoding/json writes
// `[]byte`. `null` decodes to empty.
mod base64_args {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(args: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(args))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map(Bytes::from)
                .map_err(D::Error::custom),
            None => Ok(Bytes::new()),
        }
    }
}

/// Encode an envelope to wire bytes.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(CodecError::Serialize)
}

/// Decode wire bytes into an envelope.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope> {
    serde_json::from_slice(bytes).map_err(CodecError::Deserialize)
}

/// Decode an argument payload into a concrete request type.
pub fn decode_args<T: DeserializeOwned>(args: &[u8]) -> Result<T> {
    serde_json::from_slice(args).map_err(CodecError::Deserialize)
}

/// Encode a response value as reply bytes (no wrapper).
pub fn encode_reply<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(CodecError::Serialize)
}

/// Decode reply bytes into the caller's response type.
pub fn decode_reply<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(CodecError::Deserialize)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::address::AddressError;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct HelloArgs {
        name: String,
    }

    #[test]
    fn envelope_survives_the_wire() {
        let envelope = Envelope::for_call(
            "hello_service.Hello",
            &HelloArgs {
                name: "World".to_string(),
            },
        )
        .unwrap();

        let wire = encode_envelope(&envelope).unwrap();
        let decoded = decode_envelope(&wire).unwrap();

        assert_eq!(decoded.service_name, "hello_service");
        assert_eq!(decoded.method_name, "Hello");
        assert_eq!(decoded.method_address(), "hello_service.Hello");
        let args: HelloArgs = decoded.decode_args().unwrap();
        assert_eq!(args.name, "World");
    }

    #[test]
    fn wire_uses_pascal_case_fields() {
        let envelope = Envelope::new("s", "m", b"{}".to_vec());
        let value: serde_json::Value =
            serde_json::from_slice(&encode_envelope(&envelope).unwrap()).unwrap();

        assert_eq!(value["ServiceName"], "s");
        assert_eq!(value["MethodName"], "m");
        assert_eq!(value["Args"], "e30=");
    }

    #[test]
    fn args_decode_from_base64_or_null() {
        let envelope =
            decode_envelope(br#"{"ServiceName":"s","MethodName":"m","Args":"e30="}"#).unwrap();
        assert_eq!(envelope.args.as_ref(), b"{}");

        let null_args = decode_envelope(br#"{"ServiceName":"s","Args":null}"#).unwrap();
        assert!(null_args.args.is_empty());

        assert!(matches!(
            decode_envelope(br#"{"Args":"not base64!"}"#),
            Err(CodecError::Deserialize(_))
        ));
        assert!(matches!(
            decode_envelope(br#"{"Args":[123,125]}"#),
            Err(CodecError::Deserialize(_))
        ));
    }

    #[test]
    fn medium_request_fits_one_default_read() {
        let envelope = Envelope::for_call(
            "hello_service.Hello",
            &HelloArgs {
                name: "n".repeat(300),
            },
        )
        .unwrap();
        let wire = encode_envelope(&envelope).unwrap();

        assert!(envelope.args.len() > 300);
        assert!(wire.len() < crate::framing::DEFAULT_BUFFER_SIZE, "{}", wire.len());
    }

    #[test]
    fn for_call_rejects_malformed_addresses() {
        let args = HelloArgs {
            name: "x".to_string(),
        };
        for bad in ["", "hello", "a.b.c", ".Hello", "hello."] {
            let err = Envelope::for_call(bad, &args).unwrap_err();
            assert!(matches!(err, CodecError::InvalidAddress(_)), "{bad}");
            assert!(err.is_programmer_error());
        }
        assert!(matches!(
            Envelope::for_call("", &args),
            Err(CodecError::InvalidAddress(AddressError::Empty))
        ));
    }

    #[test]
    fn for_call_rejects_unserializable_values() {
        // JSON object keys must be strings.
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1u8);

        let err = Envelope::for_call("svc.Method", &bad).unwrap_err();
        assert!(matches!(err, CodecError::Serialize(_)));
        assert!(err.is_programmer_error());
    }

    #[test]
    fn decode_is_tolerant_of_missing_fields() {
        let envelope = decode_envelope(br#"{"ServiceName":"hello_service"}"#).unwrap();
        assert_eq!(envelope.service_name, "hello_service");
        assert!(envelope.method_name.is_empty());
        assert!(envelope.args.is_empty());

        let empty = decode_envelope(b"{}").unwrap();
        assert_eq!(empty, Envelope::default());
    }

    #[test]
    fn decode_rejects_non_envelope_bytes() {
        assert!(matches!(
            decode_envelope(b"not json"),
            Err(CodecError::Deserialize(_))
        ));
        assert!(matches!(
            decode_envelope(br#"{"ServiceName":"trunc"#),
            Err(CodecError::Deserialize(_))
        ));
    }

    #[test]
    fn reply_has_no_wrapper() {
        let bytes = encode_reply(&HelloArgs {
            name: "Hi".to_string(),
        })
        .unwrap();
        assert_eq!(bytes, br#"{"Name":"Hi"}"#);

        let back: HelloArgs = decode_reply(&bytes).unwrap();
        assert_eq!(back.name, "Hi");
        assert!(matches!(
            decode_reply::<HelloArgs>(b"[1,2"),
            Err(CodecError::Deserialize(_))
        ));
    }
}
