//! Semaphore handoff over the shared transaction slot.
//!
//! Three counting semaphores guard the slot:
//!
//! - `write_permit` (starts at 1): held by the one client whose transaction is
//!   in flight. Only the server gives it back, after the full response cycle.
//! - `request_ready` (starts at 0): a client has written a request.
//! - `response_ready` (starts at 0): the server has written a response.
//!
//! Ordinary requests (`NewGame`, `Play`, malformed) take one round trip.
//! `Connect` takes two: the client acknowledges the assigned id with a second
//! `request_ready` before the server releases `write_permit`, so the next client
//! cannot overwrite the id before it has been read. `Disconnect` is
//! fire-and-forget.
//!
//! Tokio's semaphore is fair, so clients blocked on `write_permit` are served in
//! the order they started waiting.
//!
//! On shutdown the server raises the slot's terminate flag, releases
//! `write_permit` once and closes every semaphore, which wakes all waiters.
//! Each wait checks the flag as soon as it returns.

use crate::{Request, Response, TransactionSlot};
use log::debug;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    #[error("server is shutting down")]
    Shutdown,
    #[error("{0:?} must use its own handoff operation")]
    WrongOperation(Request),
}

/// The slot and its three semaphores. Create one per server with
/// [`Handoff::new`] and hand out endpoints with [`Handoff::server`] and
/// [`Handoff::client`].
pub struct Handoff {
    slot: Mutex<TransactionSlot>,
    write_permit: Semaphore,
    request_ready: Semaphore,
    response_ready: Semaphore,
}

impl Handoff {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(TransactionSlot::default()),
            write_permit: Semaphore::new(1),
            request_ready: Semaphore::new(0),
            response_ready: Semaphore::new(0),
        })
    }

    pub fn server(self: &Arc<Self>) -> HandoffServer {
        HandoffServer {
            handoff: Arc::clone(self),
        }
    }

    pub fn client(self: &Arc<Self>) -> HandoffClient {
        HandoffClient {
            handoff: Arc::clone(self),
        }
    }

    pub async fn is_terminating(&self) -> bool {
        self.slot.lock().await.terminate
    }

    /// Takes one permit from `semaphore`, then checks the terminate flag.
    async fn wait(&self, semaphore: &Semaphore) -> Result<(), HandoffError> {
        match semaphore.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(HandoffError::Shutdown),
        }

        if self.is_terminating().await {
            return Err(HandoffError::Shutdown);
        }
        Ok(())
    }

    fn signal(semaphore: &Semaphore) {
        semaphore.add_permits(1);
    }
}

/// Client side of the handoff. Cheap to clone; every clone shares the slot.
#[derive(Clone)]
pub struct HandoffClient {
    handoff: Arc<Handoff>,
}

impl HandoffClient {
    /// Two-phase connect. Returns the id the server assigned.
    pub async fn connect(&self) -> Result<u32, HandoffError> {
        let handoff = &self.handoff;
        handoff.wait(&handoff.write_permit).await?;

        Request::Connect.write_to(&mut *handoff.slot.lock().await);
        Handoff::signal(&handoff.request_ready);

        handoff.wait(&handoff.response_ready).await?;
        let client_id = handoff.slot.lock().await.client_id;

        // Second phase: the id has been read, the server may release the slot.
        Handoff::signal(&handoff.request_ready);
        debug!("Handoff connect complete, client id {}", client_id);

        Ok(client_id)
    }

    /// One request, one response. `Connect` and `Disconnect` are refused here
    /// because they follow a different number of phases.
    pub async fn transact(&self, request: Request) -> Result<Response, HandoffError> {
        if matches!(request, Request::Connect | Request::Disconnect { .. }) {
            return Err(HandoffError::WrongOperation(request));
        }

        let handoff = &self.handoff;
        handoff.wait(&handoff.write_permit).await?;

        request.write_to(&mut *handoff.slot.lock().await);
        Handoff::signal(&handoff.request_ready);

        handoff.wait(&handoff.response_ready).await?;
        let response = Response::from_slot(&*handoff.slot.lock().await);

        Ok(response)
    }

    /// Queues a disconnect. Does not wait for the server to process it.
    pub async fn disconnect(&self, client_id: u32) -> Result<(), HandoffError> {
        let handoff = &self.handoff;
        handoff.wait(&handoff.write_permit).await?;

        Request::Disconnect { client_id }.write_to(&mut *handoff.slot.lock().await);
        Handoff::signal(&handoff.request_ready);

        Ok(())
    }
}

/// Server side of the handoff. There should be exactly one per [`Handoff`].
pub struct HandoffServer {
    handoff: Arc<Handoff>,
}

impl HandoffServer {
    /// Blocks until a client has written a request.
    pub async fn next_request(&self) -> Result<Request, HandoffError> {
        let handoff = &self.handoff;
        handoff.wait(&handoff.request_ready).await?;
        let request = Request::from_slot(&*handoff.slot.lock().await);
        Ok(request)
    }

    pub async fn respond(&self, response: &Response) {
        let handoff = &self.handoff;
        response.write_to(&mut *handoff.slot.lock().await);
        Handoff::signal(&handoff.response_ready);
    }

    /// Second phase of `Connect`: waits for the client to confirm it read its id.
    pub async fn await_connect_ack(&self) -> Result<(), HandoffError> {
        let handoff = &self.handoff;
        handoff.wait(&handoff.request_ready).await
    }

    /// Hands the slot to the next waiting client.
    pub fn release(&self) {
        Handoff::signal(&self.handoff.write_permit);
    }

    /// Raises the terminate flag and wakes every waiter.
    pub async fn shutdown(&self) {
        let handoff = &self.handoff;
        handoff.slot.lock().await.terminate = true;

        Handoff::signal(&handoff.write_permit);
        handoff.write_permit.close();
        handoff.request_ready.close();
        handoff.response_ready.close();
        debug!("Handoff closed");
    }

    pub async fn is_terminating(&self) -> bool {
        self.handoff.is_terminating().await
    }
}
