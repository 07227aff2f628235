//! Rendezvous with the offer source.
//!
//! The offer source is the component that talks to the cluster resource
//! manager. An acquisition that needs new tasks makes exactly one round
//! trip with it:
//!
//! ```text
//! Manager                         OfferSource
//!   ── Revive ───────────────────────▶
//!   ◀──────────────────── acknowledge ─
//!   ── Deploy(descriptors) ──────────▶   realize tasks from offers
//!   ◀──────────────── complete(map) ───
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use taskgrid_roster::{DeploymentMap, Descriptor};

use crate::error::{RendezvousError, Stage};
use crate::wait::bounded;

/// Ask the offer source to revive offers.
#[derive(Debug)]
pub struct ReviveRequest {
    ack: oneshot::Sender<()>,
}

impl ReviveRequest {
    /// Signal that offers have been revived.
    pub fn acknowledge(self) {
        // The manager may have given up waiting already.
        let _ = self.ack.send(());
    }
}

/// Ask the offer source to realize tasks for `descriptors`.
#[derive(Debug)]
pub struct DeployRequest {
    descriptors: Vec<Descriptor>,
    reply: oneshot::Sender<DeploymentMap>,
}

impl DeployRequest {
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Report the tasks that were realized. Fewer tasks than descriptors
    /// means the deployment came up short.
    ///
    /// The tasks are handed back when the manager is gone; the caller owns
    /// them again and must tear them down.
    pub fn complete(self, deployed: DeploymentMap) -> Result<(), DeploymentMap> {
        self.reply.send(deployed)
    }
}

#[derive(Debug)]
pub enum OfferRequest {
    Revive(ReviveRequest),
    Deploy(DeployRequest),
}

/// The offer source's end of the rendezvous.
#[derive(Debug)]
pub struct OfferSource {
    rx: mpsc::Receiver<OfferRequest>,
}

impl OfferSource {
    /// Next request, or `None` once the manager is gone.
    pub async fn recv(&mut self) -> Option<OfferRequest> {
        self.rx.recv().await
    }
}

/// The manager's end of the rendezvous.
#[derive(Debug, Clone)]
pub struct OfferClient {
    tx: mpsc::Sender<OfferRequest>,
}

/// Create a connected client/source pair.
pub fn offer_channel() -> (OfferClient, OfferSource) {
    let (tx, rx) = mpsc::channel(1);
    (OfferClient { tx }, OfferSource { rx })
}

impl OfferClient {
    /// Revive offers and wait for the acknowledgement.
    pub async fn revive(
        &self,
        limit: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<(), RendezvousError> {
        let (ack, acked) = oneshot::channel();
        let request = OfferRequest::Revive(ReviveRequest { ack });

        bounded(Stage::ReviveRequest, async { self.tx.send(request).await.ok() }, limit, cancel).await?;
        bounded(Stage::ReviveAck, async { acked.await.ok() }, limit, cancel).await?;

        debug!("offers revived");
        Ok(())
    }

    /// Hand `descriptors` to the offer source. The result is collected
    /// through the returned [`PendingDeployment`].
    pub async fn deploy(
        &self,
        descriptors: Vec<Descriptor>,
        limit: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<PendingDeployment, RendezvousError> {
        let requested = descriptors.len();
        let (reply, deployed) = oneshot::channel();
        let request = OfferRequest::Deploy(DeployRequest { descriptors, reply });

        bounded(Stage::DeployRequest, async { self.tx.send(request).await.ok() }, limit, cancel).await?;
        debug!(requested, "offer source received deploy request");

        Ok(PendingDeployment { requested, deployed })
    }
}

/// A deploy request the offer source has accepted but not yet answered.
#[derive(Debug)]
pub struct PendingDeployment {
    requested: usize,
    deployed: oneshot::Receiver<DeploymentMap>,
}

impl PendingDeployment {
    /// Wait for the deployment result.
    ///
    /// After a timeout or a cancellation the request is still pending and
    /// its result can be collected with [`PendingDeployment::late`].
    pub async fn result(
        &mut self,
        limit: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<DeploymentMap, RendezvousError> {
        let deployed = &mut self.deployed;
        let deployed = bounded(Stage::DeployResult, async { deployed.await.ok() }, limit, cancel).await?;
        debug!(requested = self.requested, deployed = deployed.len(), "deployment result received");
        Ok(deployed)
    }

    /// Wait without bound for a result nobody is waiting on anymore.
    /// `None` once the offer source drops the request.
    ///
    /// Must not be called after [`PendingDeployment::result`] returned a
    /// result or reported the request closed.
    pub async fn late(self) -> Option<DeploymentMap> {
        self.deployed.await.ok()
    }
}
