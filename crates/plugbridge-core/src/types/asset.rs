//! Emitted-asset descriptors for `emit_file`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The content of an emitted asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetSource {
    /// UTF-8 text content.
    Text(String),
    /// Binary content.
    #[serde(with = "bytes_base64")]
    Binary(Bytes),
}

/// A request for the host to write an additional build artifact.
///
/// A descriptor lacking both a name and a source is a no-op, never an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedAsset {
    /// Suggested name; the host may rewrite it for uniqueness.
    #[serde(default)]
    pub name: Option<String>,
    /// Exact output file name, when the plugin insists on one.
    #[serde(default)]
    pub file_name: Option<String>,
    /// The content to write.
    #[serde(default)]
    pub source: Option<AssetSource>,
}

impl EmittedAsset {
    /// A named text asset.
    pub fn text(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            file_name: None,
            source: Some(AssetSource::Text(source.into())),
        }
    }

    /// A binary asset with an exact file name.
    pub fn binary(file_name: impl Into<String>, source: impl Into<Bytes>) -> Self {
        Self {
            name: None,
            file_name: Some(file_name.into()),
            source: Some(AssetSource::Binary(source.into())),
        }
    }

    /// Whether emitting this descriptor does nothing.
    pub fn is_noop(&self) -> bool {
        self.name.is_none() && self.file_name.is_none() && self.source.is_none()
    }

    /// The name the host should file this asset under.
    pub fn output_name(&self) -> Option<&str> {
        self.file_name.as_deref().or(self.name.as_deref())
    }
}

mod bytes_base64 {
    //! Bytes serialize as a plain byte sequence; good enough for the
    //! in-process boundary this type crosses.

    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Bytes, D::Error> {
        let raw = Vec::<u8>::deserialize(de)?;
        Ok(Bytes::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_descriptor_is_noop() {
        assert!(EmittedAsset::default().is_noop());
        assert!(!EmittedAsset::text("a.txt", "x").is_noop());
    }

    #[test]
    fn test_output_name_prefers_file_name() {
        let asset = EmittedAsset {
            name: Some("pretty".into()),
            file_name: Some("exact.bin".into()),
            source: None,
        };
        assert_eq!(asset.output_name(), Some("exact.bin"));
    }
}
