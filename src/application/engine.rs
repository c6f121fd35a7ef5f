use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::processor::RequestProcessor;
use crate::application::registry::Registry;
use crate::config::Settings;
use crate::domain::ports::{PartnerTransport, RequestParser};
use crate::domain::request::{RequestKind, parse_request_filename};
use crate::infrastructure::poller::DirectoryPoller;

/// The composition root: owns the registry, runs the polling loop, and
/// spawns one processor task per admitted request file.
///
/// There is deliberately no bound on the number of concurrent processor
/// tasks; the reference design scales with whatever the orchestrator
/// throws at the request directory.
pub struct Engine {
    settings: Arc<Settings>,
    registry: Arc<Registry>,
    parser: Arc<dyn RequestParser>,
    transport: Arc<dyn PartnerTransport>,
}

impl Engine {
    pub fn new(
        settings: Arc<Settings>,
        parser: Arc<dyn RequestParser>,
        transport: Arc<dyn PartnerTransport>,
    ) -> Self {
        Self {
            settings,
            registry: Arc::new(Registry::new()),
            parser,
            transport,
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Polls for request files until the shutdown signal fires. Nothing a
    /// single file does (malformed names, parse failures, handler errors)
    /// terminates this loop.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        info!(
            dir = %self.settings.request_dir.display(),
            "processing incoming test requests"
        );
        let mut poller = DirectoryPoller::new(self.settings.clone(), shutdown);

        while let Some(path) = poller.next_file().await {
            match parse_request_filename(&path) {
                Ok((id, kind)) => self.dispatch(&mut poller, path, id, kind).await,
                Err(err) => warn!("skipping request file: {err}"),
            }
        }
        info!("request polling stopped");
    }

    async fn dispatch(
        &self,
        poller: &mut DirectoryPoller,
        path: PathBuf,
        id: String,
        kind: RequestKind,
    ) {
        // A stuck global cancellation is cleared as soon as nothing is
        // running anymore.
        if !self.registry.global_cancel().await || !self.registry.has_active().await {
            self.registry.set_global_cancel(false).await;
        }

        // Kill files are always admitted, so a cancellation can pre-empt
        // a pending admission for the same id.
        let admit = !self.registry.has_active().await
            || !self.registry.is_active(&id).await
            || kind == RequestKind::Cancel;
        if !admit {
            debug!(%id, "test already active, deferring {}", path.display());
            poller.forget(&path);
            return;
        }

        self.registry.add_active(&id).await;
        info!(%id, "received {}", path.display());
        let processor = RequestProcessor::new(
            self.settings.clone(),
            self.registry.clone(),
            self.parser.clone(),
            self.transport.clone(),
            path,
            id,
        );
        tokio::spawn(processor.run());
    }
}
