//! Collected diagnostics: errors fail the invocation even when the
//! handler returns normally; warnings reach the host and never abort.

use std::path::Path;
use std::sync::Arc;

use plugbridge::ErrorKind;
use plugbridge::dispatchhost::{DispatchHost, DispatchHostAdapter};
use plugbridge::patternhost::{PatternHost, PatternHostAdapter};
use plugbridge::scopehost::{ScopeHost, ScopeHostAdapter};
use plugbridge::sdk::prelude::*;

use crate::helpers::{CWD, init_tracing, run_everywhere};

fn booming_plugin() -> PluginDefinition {
    PluginBuilder::new("boomer")
        .resolve_id(|_ctx, args: ResolveArgs| async move {
            Ok((args.specifier == "virtual:thing").then(|| Resolution::id("virtual:thing")))
        })
        .load(|ctx, _id: String| async move {
            // The collected error alone must fail the module, despite
            // the valid return value.
            let _ = ctx.error("boom");
            Ok(Some(LoadResult::from("export default 1")))
        })
        .build()
        .expect("boomer plugin")
}

#[tokio::test]
async fn test_collected_error_fails_module_on_every_host() {
    init_tracing();
    let cwd = Path::new(CWD);

    let adapter = PatternHostAdapter::new(Arc::new(PatternHost::new()), vec![booming_plugin()], cwd)
        .expect("adapter");
    let err = adapter.build(&["virtual:thing"]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Handler, "patternhost: {err}");
    assert!(err.to_string().contains("boom"), "patternhost: {err}");

    let adapter =
        DispatchHostAdapter::new(Arc::new(DispatchHost::new()), vec![booming_plugin()], cwd)
            .expect("adapter");
    let err = adapter.build(&["virtual:thing"]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Handler, "dispatchhost: {err}");
    assert!(err.to_string().contains("boom"), "dispatchhost: {err}");

    let adapter = ScopeHostAdapter::new(Arc::new(ScopeHost::new()), vec![booming_plugin()], cwd)
        .expect("adapter");
    let err = adapter.build(&["virtual:thing"]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Handler, "scopehost: {err}");
    assert!(err.to_string().contains("boom"), "scopehost: {err}");
}

#[tokio::test]
async fn test_warnings_reach_the_host_and_never_abort() {
    let runs = run_everywhere(
        |_log| {
            vec![
                PluginBuilder::new("warner")
                    .build_start(|ctx| async move {
                        ctx.warn("heads up");
                        Ok(())
                    })
                    .build()
                    .expect("warner plugin"),
            ]
        },
        &[],
        &[],
    )
    .await;
    for run in &runs {
        assert_eq!(run.warnings.len(), 1, "on {}", run.host);
        assert_eq!(run.warnings[0].plugin, "warner", "on {}", run.host);
        assert_eq!(run.warnings[0].message, "heads up", "on {}", run.host);
        assert!(!run.warnings[0].is_error());
    }
}

#[tokio::test]
async fn test_hook_errors_carry_the_plugin_name() {
    init_tracing();
    let failing = PluginBuilder::new("styles")
        .resolve_id(|_ctx, _args: ResolveArgs| async move {
            Err(BridgeError::handler("bad specifier"))
        })
        .build()
        .expect("styles plugin");
    let adapter =
        PatternHostAdapter::new(Arc::new(PatternHost::new()), vec![failing], Path::new(CWD))
            .expect("adapter");
    let err = adapter.build(&["./a"]).await.unwrap_err();
    assert_eq!(err.plugin.as_deref(), Some("styles"));
    assert!(err.message.starts_with("[styles]"), "{}", err.message);
}
