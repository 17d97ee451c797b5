//! Decoded mappings with position tracing.

use plugbridge_core::{BridgeError, BridgeResult};

use crate::map::SourceMap;
use crate::vlq;

/// A single decoded mapping segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Zero-based line in the generated file.
    pub dst_line: u32,
    /// Zero-based column in the generated file.
    pub dst_col: u32,
    /// Index into `sources`, when the segment maps to an original
    /// position.
    pub src: Option<u32>,
    /// Zero-based original line.
    pub src_line: u32,
    /// Zero-based original column.
    pub src_col: u32,
    /// Index into `names`, when the segment carries one.
    pub name: Option<u32>,
}

/// A traced original position, resolved to its source file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    /// Original source file name.
    pub source: String,
    /// Zero-based line in the original source.
    pub line: u32,
    /// Zero-based column in the original source.
    pub column: u32,
    /// Symbol name at that position, if recorded.
    pub name: Option<String>,
}

/// A fully decoded source map: token list sorted by generated
/// position, plus the interned string tables.
#[derive(Debug, Clone)]
pub struct DecodedMap {
    /// The generated file this map describes.
    pub file: Option<String>,
    /// Original source file names.
    pub sources: Vec<String>,
    /// Embedded original contents, parallel to `sources`.
    pub sources_content: Vec<Option<String>>,
    /// Symbol names.
    pub names: Vec<String>,
    /// Mapping segments, sorted by `(dst_line, dst_col)`.
    pub tokens: Vec<Token>,
}

impl DecodedMap {
    /// Decodes the `mappings` field of a serialized map.
    pub fn decode(map: &SourceMap) -> BridgeResult<Self> {
        let mut tokens = Vec::new();

        let mut src: i64 = 0;
        let mut src_line: i64 = 0;
        let mut src_col: i64 = 0;
        let mut name: i64 = 0;

        for (dst_line, line) in map.mappings.split(';').enumerate() {
            let mut dst_col: i64 = 0;
            for segment in line.split(',') {
                if segment.is_empty() {
                    continue;
                }
                let bytes = segment.as_bytes();
                let mut pos = 0;
                let mut fields = [0i64; 5];
                let mut count = 0;
                while pos < bytes.len() {
                    if count == 5 {
                        return Err(BridgeError::sourcemap(format!(
                            "mapping segment '{segment}' has more than five fields"
                        )));
                    }
                    fields[count] = vlq::decode(bytes, &mut pos)?;
                    count += 1;
                }
                if count != 1 && count != 4 && count != 5 {
                    return Err(BridgeError::sourcemap(format!(
                        "mapping segment '{segment}' has {count} fields"
                    )));
                }

                dst_col += fields[0];
                let mut token = Token {
                    dst_line: dst_line as u32,
                    dst_col: checked_u32(dst_col, "generated column")?,
                    src: None,
                    src_line: 0,
                    src_col: 0,
                    name: None,
                };
                if count >= 4 {
                    src += fields[1];
                    src_line += fields[2];
                    src_col += fields[3];
                    let src_idx = checked_u32(src, "source index")?;
                    if src_idx as usize >= map.sources.len() {
                        return Err(BridgeError::sourcemap(format!(
                            "source index {src_idx} out of range"
                        )));
                    }
                    token.src = Some(src_idx);
                    token.src_line = checked_u32(src_line, "original line")?;
                    token.src_col = checked_u32(src_col, "original column")?;
                }
                if count == 5 {
                    name += fields[4];
                    let name_idx = checked_u32(name, "name index")?;
                    if name_idx as usize >= map.names.len() {
                        return Err(BridgeError::sourcemap(format!(
                            "name index {name_idx} out of range"
                        )));
                    }
                    token.name = Some(name_idx);
                }
                tokens.push(token);
            }
        }

        tokens.sort_by_key(|t| (t.dst_line, t.dst_col));

        let sources_content = match &map.sources_content {
            Some(contents) => {
                let mut padded = contents.clone();
                padded.resize(map.sources.len(), None);
                padded
            }
            None => vec![None; map.sources.len()],
        };

        Ok(Self {
            file: map.file.clone(),
            sources: map.sources.clone(),
            sources_content,
            names: map.names.clone(),
            tokens,
        })
    }

    /// Re-encodes into the serialized form.
    pub fn encode(&self) -> SourceMap {
        let mut mappings = String::new();

        let mut prev_src: i64 = 0;
        let mut prev_src_line: i64 = 0;
        let mut prev_src_col: i64 = 0;
        let mut prev_name: i64 = 0;

        let mut line: u32 = 0;
        let mut prev_dst_col: i64 = 0;
        let mut first_in_line = true;

        for token in &self.tokens {
            while line < token.dst_line {
                mappings.push(';');
                line += 1;
                prev_dst_col = 0;
                first_in_line = true;
            }
            if !first_in_line {
                mappings.push(',');
            }
            first_in_line = false;

            vlq::encode(i64::from(token.dst_col) - prev_dst_col, &mut mappings);
            prev_dst_col = i64::from(token.dst_col);

            if let Some(src) = token.src {
                vlq::encode(i64::from(src) - prev_src, &mut mappings);
                prev_src = i64::from(src);
                vlq::encode(i64::from(token.src_line) - prev_src_line, &mut mappings);
                prev_src_line = i64::from(token.src_line);
                vlq::encode(i64::from(token.src_col) - prev_src_col, &mut mappings);
                prev_src_col = i64::from(token.src_col);
                if let Some(name) = token.name {
                    vlq::encode(i64::from(name) - prev_name, &mut mappings);
                    prev_name = i64::from(name);
                }
            }
        }

        let sources_content = if self.sources_content.iter().any(Option::is_some) {
            Some(self.sources_content.clone())
        } else {
            None
        };

        SourceMap {
            version: 3,
            file: self.file.clone(),
            sources: self.sources.clone(),
            sources_content,
            names: self.names.clone(),
            mappings,
        }
    }

    /// The token covering a generated position: the last token on the
    /// same generated line at or before the column.
    pub fn trace(&self, line: u32, column: u32) -> Option<&Token> {
        let idx = self
            .tokens
            .partition_point(|t| (t.dst_line, t.dst_col) <= (line, column));
        if idx == 0 {
            return None;
        }
        let token = &self.tokens[idx - 1];
        (token.dst_line == line).then_some(token)
    }

    /// Traces a generated position all the way to a named original
    /// position.
    pub fn original_position(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        let token = self.trace(line, column)?;
        let src = token.src? as usize;
        Some(OriginalPosition {
            source: self.sources.get(src)?.clone(),
            line: token.src_line,
            column: token.src_col,
            name: token
                .name
                .and_then(|n| self.names.get(n as usize).cloned()),
        })
    }
}

fn checked_u32(value: i64, what: &str) -> BridgeResult<u32> {
    u32::try_from(value)
        .map_err(|_| BridgeError::sourcemap(format!("{what} {value} out of range")))
}
