//! Filter semantics observed end to end: exclude precedence, code
//! filters re-evaluated against current content, and load gating.

use std::path::Path;

use plugbridge::filter::IdFilter;
use plugbridge::sdk::prelude::*;
use regex::Regex;

use crate::helpers::{EventLog, passthrough_resolver, run_everywhere};

#[test]
fn test_exclude_wins_over_include() {
    let spec = filters!(include: [Regex::new(r"\.js$").unwrap()], exclude: ["**/entry.js"]);
    let filter = IdFilter::compile_in(&spec, Path::new("/proj")).expect("compile");
    assert!(!filter.matches("src/entry.js"));
    assert!(filter.matches("src/mod.js"));
    // Repeated evaluation is pure.
    for _ in 0..3 {
        assert!(!filter.matches("src/entry.js"));
        assert!(filter.matches("src/mod.js"));
    }
}

fn answer_plugins(log: &EventLog) -> Vec<PluginDefinition> {
    let log = log.clone();
    vec![
        passthrough_resolver(),
        PluginBuilder::new("answer")
            .transform_filtered(
                Some(filters!(Regex::new(r"\.js$").unwrap())),
                Some(filters!("42")),
                move |_ctx, args: TransformArgs| {
                    let log = log.clone();
                    async move {
                        log.push(format!("hit:{}", args.id));
                        Ok(Some(TransformResult::from(args.code)))
                    }
                },
            )
            .build()
            .expect("answer plugin"),
    ]
}

#[tokio::test]
async fn test_code_filter_follows_content_changes() {
    let runs = run_everywhere(
        answer_plugins,
        &[("/proj/src/app.js", "let x = 42;")],
        &["/proj/src/app.js"],
    )
    .await;
    for run in &runs {
        assert_eq!(run.events, vec!["hit:/proj/src/app.js".to_string()], "on {}", run.host);
    }

    // Same id, content without the marker: the hook must skip.
    let runs = run_everywhere(
        answer_plugins,
        &[("/proj/src/app.js", "let x = 7;")],
        &["/proj/src/app.js"],
    )
    .await;
    for run in &runs {
        assert!(run.events.is_empty(), "on {}: {:?}", run.host, run.events);
        assert_eq!(run.report.modules[0].code, "let x = 7;", "on {}", run.host);
    }
}

#[tokio::test]
async fn test_load_filter_gates_ids_on_every_host() {
    let make = |_log: &EventLog| {
        vec![
            passthrough_resolver(),
            PluginBuilder::new("styles")
                .load_filtered("**/*.css", |_ctx, _id: String| async move {
                    Ok(Some(LoadResult::from("body {}")))
                })
                .build()
                .expect("styles plugin"),
        ]
    };
    let runs = run_everywhere(make, &[], &["/proj/a.css", "/proj/a.js"]).await;
    for run in &runs {
        assert_eq!(run.report.modules.len(), 1, "on {}", run.host);
        assert_eq!(run.report.modules[0].resolved.id.as_str(), "/proj/a.css");
        assert_eq!(run.report.modules[0].code, "body {}");
        // No loader claimed the .js id and no transform wants it, so
        // the raw-read fallback stays off.
        assert_eq!(run.report.unresolved, vec!["/proj/a.js".to_string()], "on {}", run.host);
    }
}
