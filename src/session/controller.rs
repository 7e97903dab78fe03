//! Session controller - the request/insert/delay loop for one resource
//!
//! Each iteration:
//! 1. Stops if cancellation was requested, before any network call
//! 2. Fetches one page with the current continuation token
//! 3. Commits the page's items and the new resume state as one unit
//! 4. Emits a progress event, then stops if that was the last page
//! 5. Waits out the request delay, which cancellation cuts short
//!
//! Errors never propagate out of the loop: they end the session with
//! `Outcome::Failed` and leave the stored state resumable.

use crate::fetcher::{CountEstimator, PageFetcher};
use crate::session::{
    fraction_complete, CancelToken, DelayOutcome, Outcome, ProgressEvent, RateLimiter,
    SessionError, SessionEvent, TerminalEvent,
};
use crate::state::{ContinuationToken, FetchState, ResourceKey};
use crate::storage::{PageStore, StorageError, StorageResult};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

/// In-memory state of one run over a resource; never persisted
#[derive(Debug)]
pub struct Session {
    resource: ResourceKey,
    cancel: CancelToken,
    token: ContinuationToken,
    resumed_records: u64,
    fetched_this_session: u64,
    estimated_total: Option<u64>,
    page_index: u32,
    resumed: bool,
    started_at: Instant,
    current_page_started_at: Option<Instant>,
    finished: Option<TerminalEvent>,
}

impl Session {
    fn new(resource: ResourceKey, token: ContinuationToken, records: u64, resumed: bool) -> Self {
        Self {
            resource,
            cancel: CancelToken::new(),
            token,
            resumed_records: records,
            fetched_this_session: 0,
            estimated_total: None,
            page_index: 0,
            resumed,
            started_at: Instant::now(),
            current_page_started_at: None,
            finished: None,
        }
    }

    pub fn resource(&self) -> &ResourceKey {
        &self.resource
    }

    /// Whether the session picked up from earlier stored state
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    pub fn continuation_token(&self) -> &ContinuationToken {
        &self.token
    }

    /// Records stored for the resource, earlier sessions included
    pub fn records_fetched(&self) -> u64 {
        self.resumed_records + self.fetched_this_session
    }

    pub fn fetched_this_session(&self) -> u64 {
        self.fetched_this_session
    }

    pub fn estimated_total(&self) -> Option<u64> {
        self.estimated_total
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Asks the loop to stop at its next checkpoint; repeated calls do nothing
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            tracing::info!("Cancellation requested for {}", self.resource);
        }
    }

    /// Handle that can cancel this session from another task
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }
}

/// Drives sessions over one fetcher and one store
pub struct SessionController<F, E, S> {
    fetcher: F,
    estimator: E,
    store: Arc<Mutex<S>>,
    limiter: RateLimiter,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl<F, E, S> SessionController<F, E, S>
where
    F: PageFetcher,
    E: CountEstimator,
    S: PageStore<F::Record> + Send,
{
    /// Creates a new controller
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Performs one page request per call
    /// * `estimator` - Best-effort total for progress reporting
    /// * `store` - Shared record and resume-state store
    /// * `request_delay` - Pause between consecutive page requests
    pub fn new(fetcher: F, estimator: E, store: Arc<Mutex<S>>, request_delay: Duration) -> Self {
        Self {
            fetcher,
            estimator,
            store,
            limiter: RateLimiter::new(request_delay),
            events: None,
        }
    }

    /// Sends progress and terminal events to `events`
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Opens a session, resuming any incomplete stored state
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - Fresh or resumed session, not yet running
    /// * `Err(SessionError::AlreadyComplete)` - Stored state says there is nothing left
    pub fn start(&self, resource: ResourceKey) -> Result<Session, SessionError> {
        let existing = self.lock_store()?.load_fetch_state(&resource)?;

        match existing {
            Some(state) if state.is_complete => Err(SessionError::AlreadyComplete(resource)),
            Some(state) => {
                tracing::info!(
                    "Resuming {} from {} ({} records stored)",
                    resource,
                    state.continuation_token,
                    state.records_fetched
                );
                if let Some(error) = &state.last_error {
                    tracing::info!("Previous session for {} failed: {}", resource, error);
                }
                Ok(Session::new(
                    resource,
                    state.continuation_token,
                    state.records_fetched,
                    true,
                ))
            }
            None => {
                tracing::info!("Starting fresh fetch of {}", resource);
                Ok(Session::new(resource, ContinuationToken::start(), 0, false))
            }
        }
    }

    /// Discards everything stored for the resource, then opens a fresh session
    pub fn restart(&self, resource: ResourceKey) -> Result<Session, SessionError> {
        {
            let mut store = self.lock_store()?;
            let purged = PageStore::<F::Record>::reset_resource(&mut *store, &resource)?;
            tracing::info!("Cleared {} stored records for {}", purged, resource);
        }
        self.start(resource)
    }

    /// Cancels a session; same as `Session::cancel`
    pub fn cancel(&self, session: &Session) {
        session.cancel();
    }

    /// Runs the session's loop to its end and returns the terminal event
    ///
    /// Running a finished session again returns its original terminal event
    /// without touching the network or the store.
    pub async fn run(&self, session: &mut Session) -> TerminalEvent {
        if let Some(done) = &session.finished {
            return done.clone();
        }

        if session.estimated_total.is_none() {
            session.estimated_total = self.estimate(session).await;
        }

        let outcome = self.run_pages(session).await;

        let event = TerminalEvent {
            resource: session.resource.clone(),
            outcome,
            records_fetched: session.records_fetched(),
            fetched_this_session: session.fetched_this_session,
            elapsed: session.elapsed(),
        };

        tracing::info!(
            "Session for {} {} after {:.1}s: {} records this session, {} total",
            event.resource,
            event.outcome,
            event.elapsed.as_secs_f64(),
            event.fetched_this_session,
            event.records_fetched
        );

        self.emit(SessionEvent::Finished(event.clone()));
        session.finished = Some(event.clone());
        event
    }

    async fn run_pages(&self, session: &mut Session) -> Outcome {
        loop {
            if session.cancel.is_cancelled() {
                return Outcome::Cancelled;
            }

            session.page_index += 1;
            session.current_page_started_at = Some(Instant::now());
            tracing::debug!(
                "Requesting page {} of {} at {}",
                session.page_index,
                session.resource,
                session.token
            );

            let page = match self
                .fetcher
                .fetch_page(&session.resource, &session.token)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        "Page {} of {} failed: {}",
                        session.page_index,
                        session.resource,
                        e
                    );
                    self.note_failure(&session.resource, &e.to_string());
                    return Outcome::Failed(e.reason());
                }
            };

            let has_more = page.has_more && !page.continuation_token.is_start();
            if page.has_more && !has_more {
                tracing::warn!(
                    "{} reported more pages without a continuation token, treating page {} as the last",
                    session.resource,
                    session.page_index
                );
            }

            let page_records = page.items.len();
            let records_fetched = session.records_fetched() + page_records as u64;
            let next_token = if has_more {
                page.continuation_token
            } else {
                ContinuationToken::start()
            };
            let state = FetchState::new(
                session.resource.clone(),
                next_token.clone(),
                records_fetched,
                !has_more,
            );

            let inserted = match self.commit(&page.items, &state) {
                Ok(inserted) => inserted,
                Err(e) => {
                    let reason = format!("storage error: {}", e);
                    tracing::error!(
                        "Failed to store page {} of {}: {}",
                        session.page_index,
                        session.resource,
                        e
                    );
                    self.note_failure(&session.resource, &reason);
                    return Outcome::Failed(reason);
                }
            };

            session.fetched_this_session += page_records as u64;
            session.token = next_token;

            if let Some(page_started) = session.current_page_started_at {
                tracing::debug!(
                    "Stored page {} of {}: {} records ({} new) in {}ms",
                    session.page_index,
                    session.resource,
                    page_records,
                    inserted,
                    page_started.elapsed().as_millis()
                );
            }

            if inserted < page_records {
                tracing::debug!(
                    "Page {} of {} overlapped stored records: {} of {} already present",
                    session.page_index,
                    session.resource,
                    page_records - inserted,
                    page_records
                );
            }

            // Empty intermediate pages don't advance the count
            if page_records > 0 || !has_more {
                self.emit(SessionEvent::Progress(ProgressEvent {
                    resource: session.resource.clone(),
                    page_index: session.page_index,
                    page_records,
                    records_fetched,
                    estimated_total: session.estimated_total,
                    fraction_complete: fraction_complete(
                        records_fetched,
                        session.estimated_total,
                        session.page_index,
                        !has_more,
                    ),
                }));
            }

            if !has_more {
                return Outcome::Completed;
            }

            if session.cancel.is_cancelled() {
                return Outcome::Cancelled;
            }

            if self.limiter.wait(&session.cancel).await == DelayOutcome::Cancelled {
                return Outcome::Cancelled;
            }
        }
    }

    /// Asks the estimator for a total; failures and zero mean "unknown"
    async fn estimate(&self, session: &Session) -> Option<u64> {
        if session.cancel.is_cancelled() {
            return None;
        }

        let result = tokio::select! {
            result = self.estimator.estimate_total(&session.resource) => result,
            _ = session.cancel.cancelled() => return None,
        };

        match result {
            Ok(0) => {
                tracing::debug!("No usable total for {}", session.resource);
                None
            }
            Ok(total) => {
                tracing::info!("Estimated {} records for {}", total, session.resource);
                Some(total)
            }
            Err(e) => {
                tracing::warn!("Could not estimate total for {}: {}", session.resource, e);
                None
            }
        }
    }

    fn commit(&self, items: &[F::Record], state: &FetchState) -> StorageResult<usize> {
        let mut store = self.lock_store()?;
        PageStore::<F::Record>::commit_page(&mut *store, items, state)
    }

    fn note_failure(&self, resource: &ResourceKey, reason: &str) {
        let result = self
            .lock_store()
            .and_then(|mut store| store.record_fetch_error(resource, reason));
        if let Err(e) = result {
            tracing::warn!("Could not record failure for {}: {}", resource, e);
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching
            let _ = events.send(event);
        }
    }

    fn lock_store(&self) -> StorageResult<MutexGuard<'_, S>> {
        self.store
            .lock()
            .map_err(|_| StorageError::Database("store lock poisoned".to_string()))
    }
}
