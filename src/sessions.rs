//! # Feature: Interactive Sessions
//!
//! Routes component and modal events to the conversation that owns a panel
//! message. Each conversation runs in its own task and sees its events one at
//! a time; an idle budget ends it cooperatively.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.6.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Per-session actors with acknowledged delivery, owner check and idle expiry
//! - 1.0.0: Initial release with async event-driven tracking

use dashmap::DashMap;
use log::{debug, warn};
use serenity::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Result of handling one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<R> {
    pub reply: R,
    /// The conversation is over once this reply is rendered
    pub finished: bool,
}

impl<R> Step<R> {
    pub fn next(reply: R) -> Self {
        Step {
            reply,
            finished: false,
        }
    }

    pub fn last(reply: R) -> Self {
        Step {
            reply,
            finished: true,
        }
    }
}

/// A conversation driven by one user's button presses and modal submissions
pub trait Dialogue: Send + 'static {
    type Action: Send + 'static;
    type Reply: Send + 'static;

    fn handle(&mut self, action: Self::Action) -> Step<Self::Reply>;

    /// Called once when the idle budget runs out. `None` means nothing to show.
    fn expire(&mut self) -> Option<Self::Reply>;

    /// Idle budget for the current state, measured from the last accepted action
    fn idle_timeout(&self) -> Duration;
}

/// Where expiry replies go, since nobody is waiting on them
#[async_trait]
pub trait SessionSurface<R: Send + 'static>: Send + Sync + 'static {
    async fn render_expiry(&self, reply: R);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// No live session for this panel
    #[error("no active session for this message")]
    NoSession,

    /// Someone other than the session owner pressed a button
    #[error("this session belongs to another user")]
    NotOwner,

    /// The session ended while the action was in flight
    #[error("the session closed before answering")]
    Closed,
}

struct Envelope<A, R> {
    action: A,
    ack: oneshot::Sender<R>,
}

struct SessionHandle<A, R> {
    id: Uuid,
    owner: u64,
    sender: mpsc::UnboundedSender<Envelope<A, R>>,
}

const REGISTRATION_POLL: Duration = Duration::from_millis(50);

/// Live sessions keyed by the message id of the panel they own
pub struct SessionRegistry<D: Dialogue> {
    sessions: Arc<DashMap<u64, SessionHandle<D::Action, D::Reply>>>,
}

impl<D: Dialogue> Clone for SessionRegistry<D> {
    fn clone(&self) -> Self {
        SessionRegistry {
            sessions: self.sessions.clone(),
        }
    }
}

impl<D: Dialogue> Default for SessionRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dialogue> SessionRegistry<D> {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Starts the actor for `dialogue` and returns its session id.
    /// A session already registered under `key` is replaced.
    pub fn open(
        &self,
        key: u64,
        owner: u64,
        dialogue: D,
        surface: Arc<dyn SessionSurface<D::Reply>>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();

        self.sessions.insert(key, SessionHandle { id, owner, sender });
        debug!("[session:{id}] opened on message {key} for user {owner}");

        tokio::spawn(Self::run(
            id,
            key,
            dialogue,
            receiver,
            self.sessions.clone(),
            surface,
        ));

        id
    }

    /// Hands `action` to the session on `key` and waits for its reply
    pub async fn deliver(
        &self,
        key: u64,
        user: u64,
        action: D::Action,
    ) -> Result<D::Reply, DeliveryError> {
        let sender = {
            let handle = self.sessions.get(&key).ok_or(DeliveryError::NoSession)?;
            if handle.owner != user {
                return Err(DeliveryError::NotOwner);
            }
            handle.sender.clone()
        };

        let (ack, reply) = oneshot::channel();
        sender
            .send(Envelope { action, ack })
            .map_err(|_| DeliveryError::Closed)?;

        reply.await.map_err(|_| DeliveryError::Closed)
    }

    /// Like [`deliver`](Self::deliver), but gives a session that is about to
    /// be opened on `key` up to `patience` to show up
    pub async fn deliver_within(
        &self,
        key: u64,
        user: u64,
        action: D::Action,
        patience: Duration,
    ) -> Result<D::Reply, DeliveryError> {
        let deadline = tokio::time::Instant::now() + patience;
        while !self.is_open(key) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(REGISTRATION_POLL).await;
        }
        self.deliver(key, user, action).await
    }

    pub fn is_open(&self, key: u64) -> bool {
        self.sessions.contains_key(&key)
    }

    pub fn owner(&self, key: u64) -> Option<u64> {
        self.sessions.get(&key).map(|handle| handle.owner)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    async fn run(
        id: Uuid,
        key: u64,
        mut dialogue: D,
        mut receiver: mpsc::UnboundedReceiver<Envelope<D::Action, D::Reply>>,
        sessions: Arc<DashMap<u64, SessionHandle<D::Action, D::Reply>>>,
        surface: Arc<dyn SessionSurface<D::Reply>>,
    ) {
        let mut expired = None;

        loop {
            let budget = dialogue.idle_timeout();
            match tokio::time::timeout(budget, receiver.recv()).await {
                Ok(Some(envelope)) => {
                    let step = dialogue.handle(envelope.action);
                    if envelope.ack.send(step.reply).is_err() {
                        warn!("[session:{id}] caller went away before the reply");
                    }
                    if step.finished {
                        debug!("[session:{id}] finished");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("[session:{id}] all senders dropped");
                    break;
                }
                Err(_) => {
                    debug!("[session:{id}] idle for {}s, expiring", budget.as_secs());
                    expired = dialogue.expire();
                    break;
                }
            }
        }

        // unregister first so late actions see NoSession
        sessions.remove_if(&key, |_, handle| handle.id == id);

        if let Some(reply) = expired {
            surface.render_expiry(reply).await;
        }
    }
}

/// One-shot deadlines for panels that carry no conversation state
#[derive(Clone, Default)]
pub struct ExpiryTimers {
    timers: Arc<DashMap<u64, (Uuid, JoinHandle<()>)>>,
}

impl ExpiryTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` once after `after`, unless disarmed first. Re-arming a key
    /// cancels the previous deadline.
    pub fn arm<F>(&self, key: u64, after: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let timers = self.timers.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            timers.remove_if(&key, |_, (armed, _)| *armed == id);
            task.await;
        });

        if let Some((_, previous)) = self.timers.insert(key, (id, handle)) {
            previous.abort();
        }
    }

    /// Cancels the deadline on `key`. Returns `false` when none was armed.
    pub fn disarm(&self, key: u64) -> bool {
        match self.timers.remove(&key) {
            Some((_, (_, handle))) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, key: u64) -> bool {
        self.timers
            .get(&key)
            .map(|entry| !entry.1.is_finished())
            .unwrap_or(false)
    }
}
