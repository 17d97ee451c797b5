//! Encoding of virtual module ids into host-safe tokens.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Token prefix shared by every encoded virtual id.
pub const SCHEME: &str = "virtual-mod://";

/// Characters escaped inside token segments. Slashes and backslashes
/// must be escaped so tokens survive hosts that normalize path
/// separators; `%` so decoding is unambiguous; `:` so the scheme
/// separator stays unique; space, `?` and `#` so tokens pass through
/// URL-shaped host pipelines intact.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b':')
    .add(b'%')
    .add(b'/')
    .add(b'\\')
    .add(b' ')
    .add(b'?')
    .add(b'#');

/// Per-plugin codec for virtual module ids.
///
/// `decode(encode(id)) == id` holds for every id, including ids that
/// contain the scheme characters themselves. A codec only decodes
/// tokens minted for its own plugin name.
#[derive(Debug, Clone)]
pub struct VirtualCodec {
    plugin: String,
    prefix: String,
}

impl VirtualCodec {
    /// Creates a codec scoped to the given plugin name.
    pub fn new(plugin: impl Into<String>) -> Self {
        let plugin = plugin.into();
        let prefix = format!("{SCHEME}{}/", utf8_percent_encode(&plugin, SEGMENT));
        Self { plugin, prefix }
    }

    /// The owning plugin name.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Encodes a virtual id into its host-safe token.
    pub fn encode(&self, id: &str) -> String {
        format!("{}{}", self.prefix, utf8_percent_encode(id, SEGMENT))
    }

    /// Whether a raw id is a token minted by this codec.
    pub fn is_token(&self, raw: &str) -> bool {
        raw.starts_with(&self.prefix)
    }

    /// Decodes a token back into the original virtual id. Returns
    /// `None` for ids minted by other plugins or non-token ids.
    pub fn decode(&self, raw: &str) -> Option<String> {
        let rest = raw.strip_prefix(&self.prefix)?;
        Some(percent_decode_str(rest).decode_utf8_lossy().into_owned())
    }
}
