//! Cross-host conformance: the same plugin set must produce the same
//! hook sequence, arguments and delivered modules in every host.

use plugbridge::Namespace;

use crate::helpers::{
    appender, assert_hosts_agree, passthrough_resolver, run_everywhere, virtual_thing_plugin,
};

#[tokio::test]
async fn test_virtual_module_round_trips_on_every_host() {
    let runs = run_everywhere(
        |log| vec![virtual_thing_plugin(log)],
        &[],
        &["virtual:thing"],
    )
    .await;
    assert_hosts_agree(&runs);
    for run in &runs {
        assert_eq!(run.report.modules.len(), 1, "on {}", run.host);
        let module = &run.report.modules[0];
        assert_eq!(module.code, "export default \"X\"", "on {}", run.host);
        assert_eq!(module.resolved.id.as_str(), "virtual:thing", "on {}", run.host);
        assert_eq!(
            module.resolved.namespace,
            Namespace::Plugin("virtual-thing".to_string()),
            "on {}",
            run.host
        );
        // Hosts that wrap virtual ids in tokens must unwrap them
        // before any hook runs.
        assert!(
            run.events.contains(&"load:virtual:thing".to_string()),
            "load saw a wrapped id on {}: {:?}",
            run.host,
            run.events
        );
        assert!(
            run.events.iter().all(|e| !e.contains("virtual-mod://")),
            "a hook saw a raw token on {}: {:?}",
            run.host,
            run.events
        );
    }
}

#[tokio::test]
async fn test_entry_importer_normalized_on_every_host() {
    // Hosts that represent entry importers as empty strings must not
    // leak that through to the resolve hook.
    let runs = run_everywhere(
        |log| vec![virtual_thing_plugin(log)],
        &[],
        &["virtual:thing"],
    )
    .await;
    for run in &runs {
        assert_eq!(
            run.events[0], "resolve:virtual:thing importer=<none> entry=true",
            "on {}",
            run.host
        );
    }
}

#[tokio::test]
async fn test_transform_chain_order_is_host_independent() {
    let runs = run_everywhere(
        |log| {
            vec![
                passthrough_resolver(),
                appender("append-a", "A", log),
                appender("append-b", "B", log),
            ]
        },
        &[("/proj/src/app.js", "x")],
        &["/proj/src/app.js"],
    )
    .await;
    assert_hosts_agree(&runs);
    for run in &runs {
        assert_eq!(run.report.modules[0].code, "x\n// A\n// B", "on {}", run.host);
        // The second stage must receive the first stage's output.
        assert_eq!(
            run.events,
            vec!["A:x".to_string(), "B:x\n// A".to_string()],
            "on {}",
            run.host
        );
    }
}

#[tokio::test]
async fn test_unknown_specifier_reported_unresolved() {
    let runs = run_everywhere(|log| vec![virtual_thing_plugin(log)], &[], &["./missing"]).await;
    assert_hosts_agree(&runs);
    for run in &runs {
        assert!(run.report.modules.is_empty(), "on {}", run.host);
        assert_eq!(run.report.unresolved, vec!["./missing".to_string()], "on {}", run.host);
    }
}
