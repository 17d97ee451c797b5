//! Lifecycle phases: declaration-order sequencing, build-fatal
//! failures, the write-bundle artifact guarantee, and watch events.

use std::path::Path;
use std::sync::Arc;

use plugbridge::dispatchhost::{DispatchHost, DispatchHostAdapter, DispatchHostContext};
use plugbridge::patternhost::{PatternHost, PatternHostAdapter, PatternHostContext};
use plugbridge::plugin::HookContext;
use plugbridge::scopehost::{ScopeHost, ScopeHostAdapter, ScopeHostContext};
use plugbridge::sdk::prelude::*;

use crate::helpers::{CWD, EventLog, init_tracing, run_everywhere};

fn phase_logger(name: &str, log: &EventLog) -> PluginDefinition {
    let start_log = log.clone();
    let end_log = log.clone();
    let bundle_log = log.clone();
    let start_name = name.to_string();
    let end_name = name.to_string();
    let bundle_name = name.to_string();
    PluginBuilder::new(name)
        .build_start(move |_ctx| {
            let log = start_log.clone();
            let name = start_name.clone();
            async move {
                log.push(format!("start:{name}"));
                Ok(())
            }
        })
        .build_end(move |_ctx| {
            let log = end_log.clone();
            let name = end_name.clone();
            async move {
                log.push(format!("end:{name}"));
                Ok(())
            }
        })
        .write_bundle(move |_ctx| {
            let log = bundle_log.clone();
            let name = bundle_name.clone();
            async move {
                log.push(format!("bundle:{name}"));
                Ok(())
            }
        })
        .build()
        .expect("phase plugin")
}

#[tokio::test]
async fn test_lifecycle_phases_run_in_declaration_order() {
    let runs = run_everywhere(
        |log| vec![phase_logger("first", log), phase_logger("second", log)],
        &[],
        &[],
    )
    .await;
    for run in &runs {
        assert_eq!(
            run.events,
            vec![
                "start:first".to_string(),
                "start:second".to_string(),
                "end:first".to_string(),
                "end:second".to_string(),
                "bundle:first".to_string(),
                "bundle:second".to_string(),
            ],
            "on {}",
            run.host
        );
    }
}

#[tokio::test]
async fn test_lifecycle_failure_stops_the_phase() {
    init_tracing();
    let log = EventLog::new();
    let boomer = PluginBuilder::new("boomer")
        .build_start(|_ctx| async move { Err(BridgeError::handler("start failed")) })
        .build()
        .expect("boomer");
    let after = phase_logger("after", &log);
    let host = Arc::new(PatternHost::new());
    let adapter = PatternHostAdapter::new(host, vec![boomer, after], Path::new(CWD))
        .expect("adapter");
    let err = adapter.build(&[]).await.unwrap_err();
    assert!(err.to_string().contains("start failed"));
    assert!(err.to_string().contains("boomer"));
    // The second plugin's build_start never ran, nor any later phase.
    assert!(log.snapshot().is_empty(), "events: {:?}", log.snapshot());
}

#[tokio::test]
async fn test_collected_error_fails_the_phase_without_a_thrown_error() {
    init_tracing();
    let log = EventLog::new();
    let swallower = PluginBuilder::new("swallower")
        .build_start(|ctx| async move {
            let _ = ctx.error("bad start option");
            Ok(())
        })
        .build()
        .expect("swallower");
    let after = phase_logger("after", &log);
    let host = Arc::new(PatternHost::new());
    let adapter = PatternHostAdapter::new(host, vec![swallower, after], Path::new(CWD))
        .expect("adapter");
    let err = adapter.build(&[]).await.unwrap_err();
    assert!(err.to_string().contains("bad start option"));
    assert!(err.to_string().contains("swallower"));
    assert!(log.snapshot().is_empty(), "events: {:?}", log.snapshot());
}

fn host_artifact_count(ctx: &HookContext) -> usize {
    let native = ctx.native_build_context();
    let any = native.as_any();
    if let Some(c) = any.downcast_ref::<PatternHostContext>() {
        c.host().artifacts().len()
    } else if let Some(c) = any.downcast_ref::<DispatchHostContext>() {
        c.host().artifacts().len()
    } else if let Some(c) = any.downcast_ref::<ScopeHostContext>() {
        c.host().artifacts().len()
    } else {
        0
    }
}

#[tokio::test]
async fn test_write_bundle_sees_artifacts_already_stored() {
    let runs = run_everywhere(
        |log| {
            let log = log.clone();
            vec![
                PluginBuilder::new("emitter")
                    .build_start(|ctx| async move {
                        ctx.emit_file(EmittedAsset::text("out.css", "body {}"));
                        Ok(())
                    })
                    .write_bundle(move |ctx| {
                        let log = log.clone();
                        let seen = host_artifact_count(&ctx);
                        async move {
                            log.push(format!("bundle:artifacts={seen}"));
                            Ok(())
                        }
                    })
                    .build()
                    .expect("emitter plugin"),
            ]
        },
        &[],
        &[],
    )
    .await;
    for run in &runs {
        assert_eq!(run.events, vec!["bundle:artifacts=1".to_string()], "on {}", run.host);
        assert_eq!(run.artifacts.len(), 1, "on {}", run.host);
        assert_eq!(run.artifacts[0].output_name(), Some("out.css"));
    }
}

#[tokio::test]
async fn test_watch_change_reaches_every_host() {
    init_tracing();
    let watcher = |log: &EventLog| {
        let log = log.clone();
        PluginBuilder::new("watcher")
            .watch_change(move |_ctx, id: String, event: WatchEvent| {
                let log = log.clone();
                async move {
                    log.push(format!("watch:{id}:{event:?}"));
                    Ok(())
                }
            })
            .build()
            .expect("watcher plugin")
    };
    let cwd = Path::new(CWD);
    let mut logs = Vec::new();

    let log = EventLog::new();
    let adapter = PatternHostAdapter::new(Arc::new(PatternHost::new()), vec![watcher(&log)], cwd)
        .expect("adapter");
    adapter.watch_change("/proj/a.ts", WatchEvent::Update).await.expect("watch");
    logs.push(log.snapshot());

    let log = EventLog::new();
    let adapter = DispatchHostAdapter::new(Arc::new(DispatchHost::new()), vec![watcher(&log)], cwd)
        .expect("adapter");
    adapter.watch_change("/proj/a.ts", WatchEvent::Update).await.expect("watch");
    logs.push(log.snapshot());

    let log = EventLog::new();
    let adapter = ScopeHostAdapter::new(Arc::new(ScopeHost::new()), vec![watcher(&log)], cwd)
        .expect("adapter");
    adapter.watch_change("/proj/a.ts", WatchEvent::Update).await.expect("watch");
    logs.push(log.snapshot());

    for events in &logs {
        assert_eq!(events, &vec!["watch:/proj/a.ts:Update".to_string()]);
    }
}
