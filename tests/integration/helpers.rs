//! Shared fixtures for the integration suite: an event log plugins
//! record their invocations into, and a harness that runs the same
//! plugin set against all three reference hosts.

use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use plugbridge::BuildReport;
use plugbridge::core::{Diagnostic, EmittedAsset, Resolution};
use plugbridge::dispatchhost::{DispatchHost, DispatchHostAdapter};
use plugbridge::patternhost::{PatternHost, PatternHostAdapter};
use plugbridge::plugin::PluginDefinition;
use plugbridge::scopehost::{ScopeHost, ScopeHostAdapter};
use plugbridge::sdk::prelude::*;

pub const CWD: &str = "/proj";

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Insertion-ordered record of hook invocations, shared between the
/// test body and the plugin closures.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.into());
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// One host's observable build output.
pub struct HostRun {
    pub host: &'static str,
    pub report: BuildReport,
    pub events: Vec<String>,
    pub artifacts: Vec<EmittedAsset>,
    pub warnings: Vec<Diagnostic>,
}

/// Runs the same plugin set and entry list in every reference host.
/// Each host gets a fresh event log and a fresh plugin set.
pub async fn run_everywhere<F>(
    make_defs: F,
    files: &[(&str, &str)],
    entries: &[&str],
) -> Vec<HostRun>
where
    F: Fn(&EventLog) -> Vec<PluginDefinition>,
{
    init_tracing();
    let cwd = Path::new(CWD);
    let mut runs = Vec::with_capacity(3);

    let log = EventLog::new();
    let host = Arc::new(PatternHost::new());
    for (path, content) in files {
        host.add_file(*path, *content);
    }
    let adapter = PatternHostAdapter::new(Arc::clone(&host), make_defs(&log), cwd)
        .expect("patternhost adapter");
    let report = adapter.build(entries).await.expect("patternhost build");
    runs.push(HostRun {
        host: "patternhost",
        report,
        events: log.snapshot(),
        artifacts: host.artifacts(),
        warnings: host.warnings(),
    });

    let log = EventLog::new();
    let host = Arc::new(DispatchHost::new());
    for (path, content) in files {
        host.add_file(*path, *content);
    }
    let adapter = DispatchHostAdapter::new(Arc::clone(&host), make_defs(&log), cwd)
        .expect("dispatchhost adapter");
    let report = adapter.build(entries).await.expect("dispatchhost build");
    runs.push(HostRun {
        host: "dispatchhost",
        report,
        events: log.snapshot(),
        artifacts: host.artifacts(),
        warnings: host.warnings(),
    });

    let log = EventLog::new();
    let host = Arc::new(ScopeHost::new());
    for (path, content) in files {
        host.add_file(*path, *content);
    }
    let adapter = ScopeHostAdapter::new(Arc::clone(&host), make_defs(&log), cwd)
        .expect("scopehost adapter");
    let report = adapter.build(entries).await.expect("scopehost build");
    runs.push(HostRun {
        host: "scopehost",
        report,
        events: log.snapshot(),
        artifacts: host.artifacts(),
        warnings: host.warnings(),
    });

    runs
}

/// Asserts every host produced the same hook sequence and the same
/// delivered modules.
pub fn assert_hosts_agree(runs: &[HostRun]) {
    let first = &runs[0];
    for run in &runs[1..] {
        assert_eq!(
            run.events, first.events,
            "hook sequence diverged between {} and {}",
            first.host, run.host
        );
        assert_eq!(
            run.report.modules.len(),
            first.report.modules.len(),
            "module count diverged on {}",
            run.host
        );
        for (theirs, ours) in run.report.modules.iter().zip(first.report.modules.iter()) {
            assert_eq!(theirs.resolved.id, ours.resolved.id, "id diverged on {}", run.host);
            assert_eq!(
                theirs.resolved.namespace, ours.resolved.namespace,
                "namespace diverged on {}",
                run.host
            );
            assert_eq!(theirs.code, ours.code, "code diverged on {}", run.host);
        }
        assert_eq!(run.report.unresolved, first.report.unresolved);
    }
}

/// A plugin owning the `virtual:thing` module, logging every
/// resolution and load it sees.
pub fn virtual_thing_plugin(log: &EventLog) -> PluginDefinition {
    let resolve_log = log.clone();
    let load_log = log.clone();
    PluginBuilder::new("virtual-thing")
        .resolve_id(move |_ctx, args: ResolveArgs| {
            let log = resolve_log.clone();
            async move {
                log.push(format!(
                    "resolve:{} importer={} entry={}",
                    args.specifier,
                    args.importer.as_deref().unwrap_or("<none>"),
                    args.is_entry
                ));
                Ok((args.specifier == "virtual:thing").then(|| Resolution::id("virtual:thing")))
            }
        })
        .load(move |_ctx, id: String| {
            let log = load_log.clone();
            async move {
                log.push(format!("load:{id}"));
                Ok((id == "virtual:thing").then(|| LoadResult::from("export default \"X\"")))
            }
        })
        .build()
        .expect("virtual-thing plugin")
}

/// A plugin resolving every specifier to itself, so file modules flow
/// into the pipeline.
pub fn passthrough_resolver() -> PluginDefinition {
    PluginBuilder::new("resolver")
        .resolve_id(|_ctx, args: ResolveArgs| async move { Ok(Some(Resolution::id(args.specifier))) })
        .build()
        .expect("resolver plugin")
}

/// A transform plugin appending `\n// <tag>`, logging the code each
/// invocation receives.
pub fn appender(name: &str, tag: &'static str, log: &EventLog) -> PluginDefinition {
    let log = log.clone();
    PluginBuilder::new(name)
        .transform(move |_ctx, args: TransformArgs| {
            let log = log.clone();
            async move {
                log.push(format!("{tag}:{}", args.code));
                Ok(Some(TransformResult::from(format!("{}\n// {tag}", args.code))))
            }
        })
        .build()
        .expect("appender plugin")
}
