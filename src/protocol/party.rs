//! A negotiating agent running in its own task

use crate::error::{ParleyError, Result};
use crate::negotiation::{Action, Message, NegotiationAgent};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// A message plus the channel its answer goes back on
struct Request {
    message: Message,
    reply: oneshot::Sender<Result<Option<Action>>>,
}

/// Handle to an agent task; messages are processed strictly in order
pub struct PartyHandle {
    name: String,
    tx: mpsc::Sender<Request>,
    task: JoinHandle<NegotiationAgent>,
}

impl PartyHandle {
    /// Move the agent into a new task
    pub fn spawn(agent: NegotiationAgent) -> Self {
        let name = agent.name().to_string();
        let (tx, mut rx) = mpsc::channel::<Request>(16);

        let task = tokio::spawn(async move {
            let mut agent = agent;
            while let Some(Request { message, reply }) = rx.recv().await {
                let result = agent.handle(message);
                if reply.send(result).is_err() {
                    debug!(agent = %agent.name(), "caller stopped waiting for reply");
                }
            }
            agent
        });

        Self { name, tx, task }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send a message and wait for the agent's answer
    pub async fn call(&self, message: Message) -> Result<Option<Action>> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request { message, reply })
            .await
            .map_err(|_| ParleyError::PartyDisconnected(self.name.clone()))?;
        response
            .await
            .map_err(|_| ParleyError::PartyDisconnected(self.name.clone()))?
    }

    /// Close the inbox, let queued messages drain and take the agent back
    pub async fn shutdown(self) -> Result<NegotiationAgent> {
        let PartyHandle { name, tx, task } = self;
        drop(tx);
        task.await
            .map_err(|e| ParleyError::Internal(format!("agent task '{}' failed: {}", name, e)))
    }
}
