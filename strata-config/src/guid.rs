//! Profile GUID helpers.
//!
//! Profiles written without a `guid` get one derived from their name (and the
//! namespace of the generator or fragment that produced them), so the same
//! profile keeps the same identity across reloads. GUIDs are written in the
//! brace-delimited lowercase form `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}`.

use serde::{Deserialize, Deserializer, Serializer};
use uuid::Uuid;

/// Namespace for GUIDs derived from a profile name alone.
pub const PROFILE_NAMESPACE: Uuid = Uuid::from_u128(0x2bde4a90_d05f_401c_9492_e40884ead1d8);

/// Namespace from which per-source namespaces are derived.
pub const SOURCE_NAMESPACE: Uuid = Uuid::from_u128(0xf65ddb7e_706b_4499_8a50_40313caf510a);

fn utf16le_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Deterministic GUID for a profile name, scoped by `source` when present.
pub fn derive_profile_guid(name: &str, source: Option<&str>) -> Uuid {
    let namespace = match source {
        Some(source) if !source.is_empty() => {
            Uuid::new_v5(&SOURCE_NAMESPACE, &utf16le_bytes(source))
        }
        _ => PROFILE_NAMESPACE,
    };
    Uuid::new_v5(&namespace, &utf16le_bytes(name))
}

/// Parse a GUID in braced, hyphenated or simple form.
pub fn parse_guid(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s.trim()).ok()
}

/// Braced lowercase text form of a GUID.
pub fn format_guid(guid: &Uuid) -> String {
    guid.braced().to_string()
}

/// `#[serde(with = "crate::guid::braced")]` for `Uuid` fields.
pub mod braced {
    use super::*;

    pub fn serialize<S: Serializer>(guid: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&guid.braced())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_guid(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid GUID '{s}'")))
    }
}

/// `#[serde(with = "crate::guid::braced_option")]` for `Option<Uuid>` fields.
pub mod braced_option {
    use super::*;

    pub fn serialize<S: Serializer>(guid: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
        match guid {
            Some(guid) => serializer.collect_str(&guid.braced()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Uuid>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_guid(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid GUID '{s}'"))),
        }
    }
}
