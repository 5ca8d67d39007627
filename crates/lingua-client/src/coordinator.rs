//! Single-flight credential refresh
//!
//! A request answered with 401 while the coordinator is idle starts exactly
//! one refresh and becomes the first waiter. Every 401 that arrives while
//! that refresh is in flight joins the waiter queue instead of refreshing
//! again. When the refresh finishes the queue is drained in order: on success
//! each waiter's request is replayed once with the new access value, on
//! failure the local session is cleared and every waiter fails.
//!
//! The check "is a refresh in flight" and the mark "a refresh is now in
//! flight" happen under one lock that is never held across an await.
//!
//! The durable store always mirrors the in-memory session: every write takes
//! the store lock, then snapshots memory and persists that snapshot. Whoever
//! changes the session in memory writes through afterwards, so the last
//! durable write always carries the latest session.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use lingua_core::CredentialPair;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::authority::{CredentialExchange, HttpAuthority};
use crate::config::ClientConfig;
use crate::error::{ClientError, SessionError};
use crate::session::{SessionStore, StoredSession, SubjectSnapshot};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh rotated the stored credentials
    Refreshed,
    /// A refresh failed and the session was cleared
    ForcedLogout,
    /// The session was ended by `sign_out`
    SignedOut,
}

type Reply = Result<ApiResponse, ClientError>;

struct Waiter {
    id: u64,
    request: ApiRequest,
    reply: oneshot::Sender<Reply>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Refreshing,
}

struct State {
    phase: Phase,
    session: Option<StoredSession>,
    /// Bumped whenever the session is replaced outside a refresh
    generation: u64,
    waiters: VecDeque<Waiter>,
    next_waiter_id: u64,
    /// Identifies the refresh currently owning `Phase::Refreshing`
    refresh_epoch: u64,
}

impl State {
    fn enqueue(&mut self, request: ApiRequest) -> oneshot::Receiver<Reply> {
        let (reply, rx) = oneshot::channel();
        let id = self.next_waiter_id;
        self.next_waiter_id += 1;
        self.waiters.push_back(Waiter { id, request, reply });
        rx
    }

    fn replace_session(&mut self, session: Option<StoredSession>) -> u64 {
        self.generation += 1;
        self.session = session;
        self.generation
    }
}

/// Decision taken under the lock for a request answered with 401
enum Action {
    Wait(oneshot::Receiver<Reply>),
    Refresh {
        rx: oneshot::Receiver<Reply>,
        job: RefreshJob,
    },
    /// A newer access value was stored while the request was in flight
    Replay {
        request: ApiRequest,
        access_token: String,
    },
}

struct RefreshJob {
    refresh_token: String,
    /// The stored refresh value is already past its expiry
    expired: bool,
    generation: u64,
    epoch: u64,
}

struct Inner {
    transport: Arc<dyn Transport>,
    exchange: Arc<dyn CredentialExchange>,
    store: Arc<dyn SessionStore>,
    refresh_timeout: Duration,
    max_waiters: usize,
    state: Mutex<State>,
    /// Serializes durable writes
    store_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

/// Sends authenticated requests and owns the refresh of their credentials
///
/// Cheap to clone; clones share one session and one waiter queue.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        exchange: Arc<dyn CredentialExchange>,
        store: Arc<dyn SessionStore>,
        config: &ClientConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                transport,
                exchange,
                store,
                refresh_timeout: config.refresh_timeout,
                max_waiters: config.max_waiters,
                state: Mutex::new(State {
                    phase: Phase::Idle,
                    session: None,
                    generation: 0,
                    waiters: VecDeque::new(),
                    next_waiter_id: 0,
                    refresh_epoch: 0,
                }),
                store_lock: tokio::sync::Mutex::new(()),
                events,
            }),
        }
    }

    /// Coordinator talking HTTP to `config.base_url`
    ///
    /// # Errors
    /// Returns `ClientError::Transport` if the HTTP client cannot be built
    pub fn http(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        let exchange = Arc::new(HttpAuthority::new(Arc::clone(&transport)));
        Ok(Self::new(transport, exchange, store, config))
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// The current session, if any
    pub fn session(&self) -> Option<StoredSession> {
        self.inner.state.lock().session.clone()
    }

    pub fn subject(&self) -> Option<SubjectSnapshot> {
        self.inner.state.lock().session.as_ref().map(|s| s.subject.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.state.lock().phase == Phase::Refreshing
    }

    /// Requests currently waiting on the in-flight refresh
    pub fn waiting(&self) -> usize {
        self.inner
            .state
            .lock()
            .waiters
            .iter()
            .filter(|w| !w.reply.is_closed())
            .count()
    }

    /// Load the durable session into memory
    ///
    /// # Errors
    /// Returns `ClientError::Session` if the store cannot be read
    pub async fn restore(&self) -> Result<Option<SubjectSnapshot>, ClientError> {
        let _writing = self.inner.store_lock.lock().await;
        let stored = self.inner.store.load().await?;
        let subject = stored.as_ref().map(|s| s.subject.clone());
        self.inner.state.lock().replace_session(stored);
        Ok(subject)
    }

    /// Adopt a freshly issued pair as the session
    ///
    /// # Errors
    /// Returns `ClientError::Session` if the pair cannot be persisted
    pub async fn establish(&self, pair: &CredentialPair) -> Result<SubjectSnapshot, ClientError> {
        let session = StoredSession::from_pair(pair);
        let subject = session.subject.clone();

        let (previous, generation) = {
            let mut state = self.inner.state.lock();
            let previous = state.session.clone();
            (previous, state.replace_session(Some(session)))
        };

        if let Err(e) = self.inner.persist_current().await {
            // The failed write left the store as it was; memory follows it back
            let mut state = self.inner.state.lock();
            if state.generation == generation {
                state.replace_session(previous);
            }
            return Err(e.into());
        }

        info!(subject_id = %subject.subject_id, "Session established");
        Ok(subject)
    }

    /// Log in and adopt the issued pair
    ///
    /// # Errors
    /// `AuthenticationFailed` for rejected credentials, `Transport` when the
    /// authority cannot be reached
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SubjectSnapshot, ClientError> {
        let pair = self.inner.exchange.login(email, password).await?;
        self.establish(&pair).await
    }

    /// End the session here and at the authority
    ///
    /// The authority logout is best effort; local state is cleared regardless.
    ///
    /// # Errors
    /// Returns `ClientError::Session` if the durable store cannot be cleared
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let ended = {
            let mut state = self.inner.state.lock();
            let ended = state.session.take();
            state.replace_session(None);
            ended
        };

        if let Some(session) = ended {
            if let Err(e) = self.inner.exchange.logout(&session.refresh_token).await {
                warn!(error = %e, "Authority logout failed");
            }
        }

        let cleared = self.inner.persist_current().await;
        let _ = self.inner.events.send(SessionEvent::SignedOut);
        info!("Signed out");

        cleared.map_err(ClientError::from)
    }

    /// Send a request with the current access value
    ///
    /// A 401 leads to at most one refresh and one replay. Other statuses are
    /// returned to the caller as they are.
    ///
    /// # Errors
    /// - `AuthenticationFailed` if there is no session, the refresh fails, or
    ///   the replay is rejected too
    /// - `WaiterQueueFull` if too many requests already wait on the refresh
    /// - `Transport` if the request cannot be exchanged at all
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let sent_with = self.access_token();
        let response = self
            .inner
            .transport
            .execute(&request, sent_with.as_deref())
            .await?;

        if !response.is_unauthorized() {
            return Ok(response);
        }
        if request.replayed {
            debug!("Replayed request rejected");
            return Err(ClientError::AuthenticationFailed);
        }

        let rx = match self.on_unauthorized(request, sent_with.as_deref())? {
            Action::Replay {
                request,
                access_token,
            } => {
                debug!("Credential changed in flight, replaying");
                return replay(self.inner.transport.as_ref(), request, &access_token).await;
            }
            Action::Wait(rx) => rx,
            Action::Refresh { rx, job } => {
                tokio::spawn(run_refresh(Arc::clone(&self.inner), job));
                rx
            }
        };

        // A dropped sender means the refresh task unwound before replying
        rx.await.unwrap_or(Err(ClientError::AuthenticationFailed))
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.send(ApiRequest::get(path)).await
    }

    fn on_unauthorized(
        &self,
        request: ApiRequest,
        sent_with: Option<&str>,
    ) -> Result<Action, ClientError> {
        let mut state = self.inner.state.lock();

        if state.phase == Phase::Refreshing {
            state.waiters.retain(|w| !w.reply.is_closed());
            if state.waiters.len() >= self.inner.max_waiters {
                warn!(max_waiters = self.inner.max_waiters, "Waiter queue full");
                return Err(ClientError::WaiterQueueFull);
            }
            return Ok(Action::Wait(state.enqueue(request)));
        }

        let Some(session) = state.session.as_ref() else {
            return Err(ClientError::AuthenticationFailed);
        };
        if sent_with != Some(session.access_token.as_str()) {
            return Ok(Action::Replay {
                access_token: session.access_token.clone(),
                request,
            });
        }

        let refresh_token = session.refresh_token.clone();
        let expired = session.refresh_expired(Utc::now());
        state.phase = Phase::Refreshing;
        state.refresh_epoch += 1;
        let rx = state.enqueue(request);
        debug!("Starting credential refresh");

        Ok(Action::Refresh {
            rx,
            job: RefreshJob {
                refresh_token,
                expired,
                generation: state.generation,
                epoch: state.refresh_epoch,
            },
        })
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("phase", &state.phase)
            .field("has_session", &state.session.is_some())
            .field("waiters", &state.waiters.len())
            .finish_non_exhaustive()
    }
}

/// Fails the queue if the refresh task is dropped before settling it
///
/// Covers a panicking exchange or store as well as runtime shutdown. The
/// epoch check keeps it from touching a later refresh.
struct SettleGuard {
    inner: Arc<Inner>,
    epoch: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let waiters = {
            let mut state = self.inner.state.lock();
            if state.phase != Phase::Refreshing || state.refresh_epoch != self.epoch {
                return;
            }
            state.phase = Phase::Idle;
            std::mem::take(&mut state.waiters)
        };
        warn!(waiters = waiters.len(), "Refresh task ended without settling its waiters");
        reject_all(waiters);
    }
}

async fn run_refresh(inner: Arc<Inner>, job: RefreshJob) {
    let _guard = SettleGuard {
        inner: Arc::clone(&inner),
        epoch: job.epoch,
    };

    if job.expired {
        inner.fail("refresh credential expired", job.generation).await;
        return;
    }

    let outcome =
        tokio::time::timeout(inner.refresh_timeout, inner.exchange.refresh(&job.refresh_token))
            .await;

    match outcome {
        Ok(Ok(pair)) => inner.complete(&pair, job.generation).await,
        Ok(Err(e)) => inner.fail(&e.to_string(), job.generation).await,
        Err(_) => inner.fail("refresh timed out", job.generation).await,
    }
}

impl Inner {
    /// Write the current in-memory session through to the durable store
    async fn persist_current(&self) -> Result<(), SessionError> {
        let _writing = self.store_lock.lock().await;
        self.write_snapshot().await
    }

    /// Caller holds `store_lock`
    async fn write_snapshot(&self) -> Result<(), SessionError> {
        let current = self.state.lock().session.clone();
        match current {
            Some(session) => self.store.save(&session).await,
            None => self.store.clear().await,
        }
    }

    fn owns_session(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    async fn complete(&self, pair: &CredentialPair, generation: u64) {
        let refreshed = StoredSession::from_pair(pair);

        let writing = self.store_lock.lock().await;
        let saved = if self.owns_session(generation) {
            self.store.save(&refreshed).await
        } else {
            Ok(())
        };

        let (waiters, adopted, current) = {
            let mut state = self.state.lock();
            state.phase = Phase::Idle;
            let waiters = std::mem::take(&mut state.waiters);
            let adopted = state.generation == generation;
            if adopted {
                state.session = Some(refreshed);
            }
            (waiters, adopted, state.session.clone())
        };

        let synced = if adopted { saved } else { self.write_snapshot().await };
        drop(writing);
        if let Err(e) = synced {
            warn!(error = %e, "Failed to persist session after refresh");
        }

        let access_token = match current {
            Some(session) if adopted => {
                let _ = self.events.send(SessionEvent::Refreshed);
                info!(waiters = waiters.len(), "Credential refresh succeeded");
                session.access_token
            }
            // Signed in elsewhere while refreshing; the rotated pair is dropped
            Some(session) => {
                debug!("Session replaced during refresh");
                session.access_token
            }
            None => {
                debug!("Signed out during refresh");
                reject_all(waiters);
                return;
            }
        };

        let transport = self.transport.as_ref();
        let access_token = access_token.as_str();
        let replays = waiters.into_iter().filter_map(|waiter| {
            if waiter.reply.is_closed() {
                debug!(waiter = waiter.id, "Skipping abandoned waiter");
                return None;
            }
            Some(async move {
                let result = replay(transport, waiter.request, access_token).await;
                if waiter.reply.send(result).is_err() {
                    debug!(waiter = waiter.id, "Waiter left before its replay finished");
                }
            })
        });

        // Polled in queue order, so replays are dispatched in enqueue order
        join_all(replays).await;
    }

    async fn fail(&self, reason: &str, generation: u64) {
        warn!(reason, "Credential refresh failed");

        let writing = self.store_lock.lock().await;
        // Durable state goes first, before memory and before any waiter hears
        let cleared = if self.owns_session(generation) {
            self.store.clear().await
        } else {
            Ok(())
        };

        let (waiters, forced) = {
            let mut state = self.state.lock();
            state.phase = Phase::Idle;
            let waiters = std::mem::take(&mut state.waiters);
            let forced = state.generation == generation;
            if forced {
                state.session = None;
            }
            (waiters, forced)
        };

        let synced = if forced { cleared } else { self.write_snapshot().await };
        drop(writing);
        if let Err(e) = synced {
            warn!(error = %e, "Failed to clear stored session");
        }

        reject_all(waiters);

        if forced {
            let _ = self.events.send(SessionEvent::ForcedLogout);
        }
    }
}

async fn replay(transport: &dyn Transport, request: ApiRequest, access_token: &str) -> Reply {
    let request = request.into_replay();
    let response = transport.execute(&request, Some(access_token)).await?;

    if response.is_unauthorized() {
        debug!(path = %request.path, "Replay rejected");
        return Err(ClientError::AuthenticationFailed);
    }
    Ok(response)
}

fn reject_all(waiters: VecDeque<Waiter>) {
    for waiter in waiters {
        let _ = waiter.reply.send(Err(ClientError::AuthenticationFailed));
    }
}
