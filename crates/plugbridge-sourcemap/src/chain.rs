//! Composition of successive stage maps into one map.

use std::collections::HashMap;

use plugbridge_core::BridgeResult;
use tracing::debug;

use crate::decoded::{DecodedMap, Token};
use crate::map::SourceMap;

/// Composes the maps produced by successive load/transform stages
/// into one map for `file`, traceable to the original source.
///
/// **Ordering convention:** `maps[0]` is the map emitted by the most
/// recent stage and the last element is the map closest to the
/// original source. Identity maps (empty `sources`) are dropped
/// before anything else happens; zero surviving maps yields the
/// canonical empty map.
///
/// The composition mode is selected once per call: **chain** mode
/// when every surviving map except possibly the last has exactly one
/// source (the single-file transform-pipeline case, composed pairwise
/// from the outside in), **multi-source** mode otherwise (inner
/// sources resolved by file-name lookup, identity fallback for
/// sources no map describes).
pub fn combine(file: &str, maps: &[SourceMap]) -> BridgeResult<SourceMap> {
    let decoded: Vec<DecodedMap> = maps
        .iter()
        .filter(|m| !m.is_identity())
        .map(DecodedMap::decode)
        .collect::<BridgeResult<_>>()?;

    if decoded.is_empty() {
        return Ok(SourceMap::empty());
    }

    let mut combined = if decoded.len() == 1 {
        decoded.into_iter().next().expect("one decoded map")
    } else {
        let chain_mode = decoded[..decoded.len() - 1]
            .iter()
            .all(|m| m.sources.len() == 1);
        debug!(
            file,
            stages = decoded.len(),
            mode = if chain_mode { "chain" } else { "multi-source" },
            "combining source maps"
        );
        if chain_mode {
            let mut iter = decoded.into_iter();
            let mut acc = iter.next().expect("outermost map");
            for inner in iter {
                acc = compose(&acc, &inner);
            }
            acc
        } else {
            combine_multi_source(decoded)
        }
    };

    combined.file = Some(file.to_string());
    Ok(combined.encode())
}

/// Pairwise composition: every generated position of `outer` is
/// traced through `inner`; positions `inner` cannot account for are
/// dropped.
fn compose(outer: &DecodedMap, inner: &DecodedMap) -> DecodedMap {
    let mut builder = TableBuilder::default();
    let mut tokens = Vec::with_capacity(outer.tokens.len());

    for token in &outer.tokens {
        if token.src.is_none() {
            continue;
        }
        let Some(hit) = inner.trace(token.src_line, token.src_col) else {
            continue;
        };
        let Some(inner_src) = hit.src else {
            continue;
        };
        let src = builder.intern_source(
            &inner.sources[inner_src as usize],
            inner.sources_content[inner_src as usize].clone(),
        );
        let name = hit
            .name
            .and_then(|n| inner.names.get(n as usize))
            .or_else(|| token.name.and_then(|n| outer.names.get(n as usize)))
            .map(|n| builder.intern_name(n));
        tokens.push(Token {
            dst_line: token.dst_line,
            dst_col: token.dst_col,
            src: Some(src),
            src_line: hit.src_line,
            src_col: hit.src_col,
            name,
        });
    }

    builder.finish(tokens)
}

/// Multi-source composition: the outermost map's sources are resolved
/// by name against the remaining maps' `file` fields and followed as
/// far as maps exist for them.
fn combine_multi_source(decoded: Vec<DecodedMap>) -> DecodedMap {
    let (outer, rest) = decoded.split_first().expect("outermost map");
    let by_file: HashMap<&str, &DecodedMap> = rest
        .iter()
        .filter_map(|m| m.file.as_deref().map(|f| (f, m)))
        .collect();

    let mut builder = TableBuilder::default();
    let mut tokens = Vec::with_capacity(outer.tokens.len());

    for token in &outer.tokens {
        let Some(outer_src) = token.src else { continue };
        let mut source = outer.sources[outer_src as usize].clone();
        let mut content = outer.sources_content[outer_src as usize].clone();
        let mut line = token.src_line;
        let mut col = token.src_col;
        let mut name = token
            .name
            .and_then(|n| outer.names.get(n as usize))
            .cloned();

        // Follow name lookups inwards; sources no map describes keep
        // their current (identity) position. Bounded by the stage
        // count so a self-referential file name cannot loop.
        for _ in 0..rest.len() {
            let Some(inner) = by_file.get(source.as_str()) else {
                break;
            };
            let Some(hit) = inner.trace(line, col) else {
                break;
            };
            let Some(inner_src) = hit.src else { break };
            source = inner.sources[inner_src as usize].clone();
            content = inner.sources_content[inner_src as usize].clone();
            line = hit.src_line;
            col = hit.src_col;
            if let Some(n) = hit.name.and_then(|n| inner.names.get(n as usize)) {
                name = Some(n.clone());
            }
        }

        let src = builder.intern_source(&source, content);
        let name = name.map(|n| builder.intern_name(&n));
        tokens.push(Token {
            dst_line: token.dst_line,
            dst_col: token.dst_col,
            src: Some(src),
            src_line: line,
            src_col: col,
            name,
        });
    }

    builder.finish(tokens)
}

/// Interning builder for the combined map's string tables.
#[derive(Default)]
struct TableBuilder {
    sources: Vec<String>,
    contents: Vec<Option<String>>,
    source_idx: HashMap<String, u32>,
    names: Vec<String>,
    name_idx: HashMap<String, u32>,
}

impl TableBuilder {
    fn intern_source(&mut self, source: &str, content: Option<String>) -> u32 {
        if let Some(&idx) = self.source_idx.get(source) {
            if self.contents[idx as usize].is_none() {
                self.contents[idx as usize] = content;
            }
            return idx;
        }
        let idx = self.sources.len() as u32;
        self.sources.push(source.to_string());
        self.contents.push(content);
        self.source_idx.insert(source.to_string(), idx);
        idx
    }

    fn intern_name(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.name_idx.get(name) {
            return idx;
        }
        let idx = self.names.len() as u32;
        self.names.push(name.to_string());
        self.name_idx.insert(name.to_string(), idx);
        idx
    }

    fn finish(self, tokens: Vec<Token>) -> DecodedMap {
        DecodedMap {
            file: None,
            sources: self.sources,
            sources_content: self.contents,
            names: self.names,
            tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_map(file: &str, source: &str, tokens: &[(u32, u32, u32, u32)]) -> SourceMap {
        DecodedMap {
            file: Some(file.into()),
            sources: vec![source.into()],
            sources_content: vec![None],
            names: vec![],
            tokens: tokens
                .iter()
                .map(|&(dl, dc, sl, sc)| Token {
                    dst_line: dl,
                    dst_col: dc,
                    src: Some(0),
                    src_line: sl,
                    src_col: sc,
                    name: None,
                })
                .collect(),
        }
        .encode()
    }

    #[test]
    fn test_zero_maps_yields_canonical_empty_map() {
        let combined = combine("out.js", &[]).expect("combine");
        assert_eq!(combined, SourceMap::empty());
    }

    #[test]
    fn test_identity_maps_are_dropped() {
        let combined =
            combine("out.js", &[SourceMap::empty(), SourceMap::empty()]).expect("combine");
        assert_eq!(combined.sources, Vec::<String>::new());
        assert_eq!(combined.mappings, "");
    }

    #[test]
    fn test_single_map_passes_through_with_file() {
        let map = linear_map("stage1.js", "original.js", &[(0, 0, 0, 0), (0, 6, 0, 3)]);
        let combined = combine("stage1.js", &[map]).expect("combine");
        assert_eq!(combined.file.as_deref(), Some("stage1.js"));
        assert_eq!(combined.sources, vec!["original.js"]);
    }

    #[test]
    fn test_chain_composition_is_transitive() {
        // A: original.js -> stage1.js, B: stage1.js -> stage2.js.
        let map_a = linear_map("stage1.js", "original.js", &[(0, 0, 0, 0), (0, 4, 0, 2)]);
        let map_b = linear_map("stage2.js", "stage1.js", &[(0, 0, 0, 0), (0, 7, 0, 4)]);

        let combined = combine("stage2.js", &[map_b.clone(), map_a.clone()]).expect("combine");
        let combined = DecodedMap::decode(&combined).expect("decode");

        let b = DecodedMap::decode(&map_b).expect("decode b");
        let a = DecodedMap::decode(&map_a).expect("decode a");

        for col in [0u32, 3, 7, 20] {
            let direct = combined.original_position(0, col);
            let via_b = b.trace(0, col).and_then(|t| t.src.map(|_| t));
            let stepwise = via_b
                .and_then(|t| a.original_position(t.src_line, t.src_col))
                .map(|p| (p.source, p.line, p.column));
            assert_eq!(
                direct.map(|p| (p.source, p.line, p.column)),
                stepwise,
                "divergence at column {col}"
            );
        }
    }

    #[test]
    fn test_chain_drops_untraceable_tokens() {
        // B maps a position A knows nothing about (line 9).
        let map_a = linear_map("stage1.js", "original.js", &[(0, 0, 0, 0)]);
        let map_b = linear_map("stage2.js", "stage1.js", &[(0, 0, 9, 0)]);

        let combined = combine("stage2.js", &[map_b, map_a]).expect("combine");
        let decoded = DecodedMap::decode(&combined).expect("decode");
        assert!(decoded.tokens.is_empty());
    }

    #[test]
    fn test_multi_source_mode_resolves_by_name() {
        // bundle.js fans in from s1.js and s2.js; only s1.js has an
        // inner map, s2.js falls back to identity.
        let outer = DecodedMap {
            file: Some("bundle.js".into()),
            sources: vec!["s1.js".into(), "s2.js".into()],
            sources_content: vec![None, None],
            names: vec![],
            tokens: vec![
                Token {
                    dst_line: 0,
                    dst_col: 0,
                    src: Some(0),
                    src_line: 0,
                    src_col: 5,
                    name: None,
                },
                Token {
                    dst_line: 1,
                    dst_col: 0,
                    src: Some(1),
                    src_line: 2,
                    src_col: 1,
                    name: None,
                },
            ],
        }
        .encode();
        let inner_s1 = linear_map("s1.js", "s1.orig.js", &[(0, 0, 4, 0)]);

        let combined = combine("bundle.js", &[outer, inner_s1]).expect("combine");
        let decoded = DecodedMap::decode(&combined).expect("decode");

        let first = decoded.original_position(0, 0).expect("token");
        assert_eq!(first.source, "s1.orig.js");
        assert_eq!((first.line, first.column), (4, 0));

        let second = decoded.original_position(1, 0).expect("token");
        assert_eq!(second.source, "s2.js");
        assert_eq!((second.line, second.column), (2, 1));
    }

    #[test]
    fn test_sources_content_survives_chaining() {
        let inner = DecodedMap {
            file: Some("stage1.js".into()),
            sources: vec!["original.js".into()],
            sources_content: vec![Some("let x = 1;".into())],
            names: vec![],
            tokens: vec![Token {
                dst_line: 0,
                dst_col: 0,
                src: Some(0),
                src_line: 0,
                src_col: 0,
                name: None,
            }],
        }
        .encode();
        let outer = linear_map("stage2.js", "stage1.js", &[(0, 0, 0, 0)]);

        let combined = combine("stage2.js", &[outer, inner]).expect("combine");
        assert_eq!(combined.content_for(0), Some("let x = 1;"));
    }
}
