//! # todosync Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer and executes effects
//! - **Effect Executor**: Spawns effect futures and feeds their actions back
//! - **Effect Handle**: Lets a caller wait until an action has settled,
//!   including every action its effects fed back
//!
//! ## Example
//!
//! ```ignore
//! use todosync_runtime::Store;
//!
//! let store = Store::new(AppState::default(), AppReducer, environment);
//!
//! // Send an intent and wait for the mutation and its refetch to settle
//! let mut handle = store.send(AppAction::AddTodo { title: "Buy milk".into() }).await?;
//! handle.wait().await;
//!
//! // Read state
//! let count = store.state(|s| s.todos().len()).await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use todosync_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{watch, RwLock};

pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned when `send()` is called after shutdown started.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for effects or for a matching action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Tracking cascades: an action fed back by
/// an effect is reduced under the same handle, so the handle only completes
/// once the whole chain (mutation, outcome, refetch, loaded list) is done.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(AppAction::ToggleTodo { id }).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The toggle and the refetch it triggered have both been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a handle together with the tracking context effects report to
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// Useful as the initial value of a `last_handle` in loops.
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running under this handle
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracking context is gone; nothing can still be running.
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete, giving up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout expires. The effects themselves keep running.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: decrements the effect counter on drop, even if the effect panics
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreError,
    };
    use tokio::sync::broadcast;

    /// Default capacity of the action broadcast channel
    const DEFAULT_BROADCAST_CAPACITY: usize = 16;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (remote collaborators)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Reducer calls are serialized by the write lock, so every action
    /// observes the state left by the previous one.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it
        /// is reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Sync + Clone + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a new Store with custom action broadcast capacity
        ///
        /// Default capacity is 16. Increase if observers frequently lag.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Spawns the returned effects
        ///
        /// `send()` returns once the effects are started. Use the returned
        /// [`EffectHandle`] to wait until they, and every action they feed
        /// back, have been processed.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let (handle, tracking) = EffectHandle::new();
            self.dispatch(action, &tracking).await;

            Ok(handle)
        }

        /// Send an action and wait for a matching action fed back by an effect
        ///
        /// Subscribes before sending, so a fast effect cannot slip past.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before the timeout
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to every action produced by effects
        ///
        /// Actions sent directly through [`Store::send`] are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let visible = store.state(|s| s.view().visible.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Number of effects currently running across all handles
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Reduce one action and start its effects under `tracking`
        async fn dispatch(&self, action: A, tracking: &EffectTracking) {
            metrics::counter!("store.actions.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                effects
            };

            tracing::trace!(effects = effects.len(), "Reducer completed");
            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }
        }

        /// Start one effect
        ///
        /// Counters are incremented before this returns, so a caller holding
        /// a [`DecrementGuard`] for the same tracking can never observe zero
        /// while a child effect is still pending.
        #[allow(clippy::needless_pass_by_value)] // tracking is moved into spawned tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking.clone());
                        let _pending_guard = pending_guard;

                        if let Some(action) = fut.await {
                            tracing::trace!(?action, "Effect produced an action");
                            let _ = store.action_broadcast.send(action.clone());
                            store.dispatch(action, &tracking).await;
                        }
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking);
                        let _pending_guard = pending_guard;

                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}
