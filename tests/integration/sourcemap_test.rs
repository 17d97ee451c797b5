//! Sourcemaps observed end to end: stage maps combined host-
//! independently, and load maps chained behind transform maps.

use plugbridge::sdk::prelude::*;
use plugbridge::sourcemap::{DecodedMap, Token};

use crate::helpers::{EventLog, init_tracing, passthrough_resolver, run_everywhere};

fn single_token_map(file: &str, source: &str, dst: (u32, u32), src: (u32, u32)) -> SourceMap {
    DecodedMap {
        file: Some(file.to_string()),
        sources: vec![source.to_string()],
        sources_content: vec![None],
        names: vec![],
        tokens: vec![Token {
            dst_line: dst.0,
            dst_col: dst.1,
            src: Some(0),
            src_line: src.0,
            src_col: src.1,
            name: None,
        }],
    }
    .encode()
}

fn staged_plugins(_log: &EventLog) -> Vec<PluginDefinition> {
    vec![
        passthrough_resolver(),
        PluginBuilder::new("stage-a")
            .transform(|_ctx, args: TransformArgs| async move {
                Ok(Some(TransformResult {
                    code: format!("{}\n// A", args.code),
                    map: Some(single_token_map("stage-a.js", "/proj/gen.js", (0, 0), (0, 0))),
                }))
            })
            .build()
            .expect("stage-a plugin"),
        PluginBuilder::new("stage-b")
            .transform(|_ctx, args: TransformArgs| async move {
                Ok(Some(TransformResult {
                    code: format!("{}\n// B", args.code),
                    map: Some(single_token_map("stage-b.js", "stage-a.js", (0, 0), (0, 0))),
                }))
            })
            .build()
            .expect("stage-b plugin"),
    ]
}

#[tokio::test]
async fn test_transform_stage_maps_combine_identically_across_hosts() {
    let runs = run_everywhere(staged_plugins, &[("/proj/gen.js", "x")], &["/proj/gen.js"]).await;
    let reference = runs[0].report.modules[0].map.clone().expect("combined map");
    let decoded = DecodedMap::decode(&reference).expect("decode");
    // The chain collapses to the original source.
    assert_eq!(decoded.sources, vec!["/proj/gen.js".to_string()]);
    let pos = decoded.original_position(0, 0).expect("traced position");
    assert_eq!((pos.source.as_str(), pos.line, pos.column), ("/proj/gen.js", 0, 0));
    for run in &runs[1..] {
        assert_eq!(
            run.report.modules[0].map.as_ref(),
            Some(&reference),
            "combined map diverged on {}",
            run.host
        );
    }
}

fn chained_plugins(_log: &EventLog) -> Vec<PluginDefinition> {
    vec![
        PluginBuilder::new("gen")
            .resolve_id(|_ctx, args: ResolveArgs| async move {
                Ok((args.specifier == "virtual:gen").then(|| Resolution::id("virtual:gen")))
            })
            .load(|_ctx, _id: String| async move {
                Ok(Some(LoadResult {
                    code: "let x = 1;".to_string(),
                    map: Some(single_token_map("virtual:gen", "src.ts", (0, 0), (3, 2))),
                }))
            })
            .build()
            .expect("gen plugin"),
        PluginBuilder::new("decorate")
            .transform(|_ctx, args: TransformArgs| async move {
                Ok(Some(TransformResult {
                    code: args.code,
                    map: Some(single_token_map("decorated.js", "virtual:gen", (0, 0), (0, 0))),
                }))
            })
            .build()
            .expect("decorate plugin"),
    ]
}

#[tokio::test]
async fn test_load_map_chains_behind_transform_map_on_every_host() {
    init_tracing();
    let runs = run_everywhere(chained_plugins, &[], &["virtual:gen"]).await;
    for run in &runs {
        let map = run.report.modules[0].map.as_ref().expect("combined map");
        let decoded = DecodedMap::decode(map).expect("decode");
        let pos = decoded.original_position(0, 0).expect("traced position");
        assert_eq!(
            (pos.source.as_str(), pos.line, pos.column),
            ("src.ts", 3, 2),
            "load map lost on {}",
            run.host
        );
    }
}
