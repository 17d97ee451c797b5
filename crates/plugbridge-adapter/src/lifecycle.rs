//! Build-phase and watch dispatch.
//!
//! Lifecycle hooks run sequentially in dispatch order; the first
//! failure, returned or collected via `ctx.error`, stops the phase
//! and is build-fatal.

use plugbridge_core::{BridgeResult, DiagnosticLevel, WatchEvent};
use tracing::info;

use crate::pipeline::BuildAdapter;

impl BuildAdapter {
    /// Fires `build_start` on every plugin that declares it.
    pub async fn build_start(&self) -> BridgeResult<()> {
        info!(build_id = %self.build_id(), "build start");
        for plugin in self.registry.plugins() {
            let Some(hook) = &plugin.build_start else {
                continue;
            };
            let ctx = self.factory.create(&plugin.name, None);
            self.guarded(&ctx, &plugin.name, hook.run(ctx.clone())).await?;
        }
        Ok(())
    }

    /// Fires `build_end` on every plugin that declares it, then
    /// forwards any pending warnings to the host.
    pub async fn build_end(&self) -> BridgeResult<()> {
        for plugin in self.registry.plugins() {
            let Some(hook) = &plugin.build_end else {
                continue;
            };
            let ctx = self.factory.create(&plugin.name, None);
            self.guarded(&ctx, &plugin.name, hook.run(ctx.clone())).await?;
        }
        self.flush_warnings();
        info!(build_id = %self.build_id(), "build end");
        Ok(())
    }

    /// Persists emitted assets through the driver, then fires
    /// `write_bundle`. Hooks never observe a state where artifacts
    /// are not yet durably written.
    pub async fn write_bundle(&self) -> BridgeResult<()> {
        let assets = self.factory.emitted_assets();
        self.driver.write_artifacts(&assets).await?;
        info!(
            build_id = %self.build_id(),
            assets = assets.len(),
            "artifacts written"
        );
        for plugin in self.registry.plugins() {
            let Some(hook) = &plugin.write_bundle else {
                continue;
            };
            let ctx = self.factory.create(&plugin.name, None);
            self.guarded(&ctx, &plugin.name, hook.run(ctx.clone())).await?;
        }
        self.flush_warnings();
        Ok(())
    }

    /// Fires `watch_change` on every plugin that declares it.
    pub async fn watch_change(&self, id: &str, event: WatchEvent) -> BridgeResult<()> {
        info!(build_id = %self.build_id(), id = %id, event = %event, "watched file changed");
        for plugin in self.registry.plugins() {
            let Some(hook) = &plugin.watch_change else {
                continue;
            };
            let ctx = self.factory.create(&plugin.name, None);
            self.guarded(&ctx, &plugin.name, hook.on_change(ctx.clone(), id.to_string(), event))
                .await?;
        }
        Ok(())
    }

    /// Forwards warnings recorded since the last flush to the host's
    /// reporting channel.
    pub fn flush_warnings(&self) {
        let warnings: Vec<_> = self
            .factory
            .diagnostics()
            .into_iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .collect();
        if let Ok(mut forwarded) = self.forwarded_warnings.lock() {
            for diagnostic in warnings.iter().skip(*forwarded) {
                self.driver.forward_warning(diagnostic);
            }
            *forwarded = warnings.len();
        }
    }
}
