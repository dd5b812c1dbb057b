//! Integration tests for the Store runtime
//!
//! Covers the action → reducer → effect → action feedback loop and the
//! cascading completion of [`EffectHandle`].

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::time::Duration;
use todosync_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use todosync_runtime::{Store, StoreError};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Write something, then refetch
    Save { value: u32 },
    /// Write finished
    Saved { value: u32 },
    /// Refetch requested
    Reload,
    /// Refetch finished
    Reloaded { values: Vec<u32> },
    /// Two loads at once
    LoadBoth,
    /// One of the parallel loads finished
    Loaded { source: &'static str },
    /// Run steps in order
    RunSteps,
    /// A sequential step finished
    Step { index: u32 },
    /// No effects at all
    Noop,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    remote: Vec<u32>,
    local: Vec<u32>,
    loaded: Vec<&'static str>,
    steps: Vec<u32>,
    reloads: u32,
}

#[derive(Clone)]
struct TestEnvironment {
    latency: Duration,
}

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Save { value } => {
                let latency = env.latency;
                smallvec![Effect::future(async move {
                    tokio::time::sleep(latency).await;
                    Some(TestAction::Saved { value })
                })]
            },
            TestAction::Saved { value } => {
                state.remote.push(value);
                smallvec![Effect::future(async { Some(TestAction::Reload) })]
            },
            TestAction::Reload => {
                state.reloads += 1;
                let values = state.remote.clone();
                let latency = env.latency;
                smallvec![Effect::future(async move {
                    tokio::time::sleep(latency).await;
                    Some(TestAction::Reloaded { values })
                })]
            },
            TestAction::Reloaded { values } => {
                state.local = values;
                SmallVec::new()
            },
            TestAction::LoadBoth => smallvec![Effect::merge(vec![
                Effect::future(async { Some(TestAction::Loaded { source: "a" }) }),
                Effect::future(async { Some(TestAction::Loaded { source: "b" }) }),
            ])],
            TestAction::Loaded { source } => {
                state.loaded.push(source);
                SmallVec::new()
            },
            TestAction::RunSteps => {
                let latency = env.latency;
                smallvec![Effect::chain(vec![
                    Effect::future(async move {
                        tokio::time::sleep(latency * 3).await;
                        Some(TestAction::Step { index: 1 })
                    }),
                    Effect::future(async { Some(TestAction::Step { index: 2 }) }),
                ])]
            },
            TestAction::Step { index } => {
                state.steps.push(index);
                SmallVec::new()
            },
            TestAction::Noop => smallvec![Effect::None],
        }
    }
}

fn test_store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(
        TestState::default(),
        TestReducer,
        TestEnvironment {
            latency: Duration::from_millis(5),
        },
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn handle_waits_for_the_whole_feedback_chain() {
    let store = test_store();

    let mut handle = store.send(TestAction::Save { value: 7 }).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(2))
        .await
        .unwrap();

    let (local, reloads) = store.state(|s| (s.local.clone(), s.reloads)).await;
    assert_eq!(local, vec![7]);
    assert_eq!(reloads, 1);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test]
async fn action_without_effects_completes_immediately() {
    let store = test_store();

    let mut handle = store.send(TestAction::Noop).await.unwrap();
    assert_eq!(handle.pending(), 0);
    handle
        .wait_with_timeout(Duration::from_millis(50))
        .await
        .unwrap();
}

#[tokio::test]
async fn parallel_effects_are_all_tracked() {
    let store = test_store();

    let mut handle = store.send(TestAction::LoadBoth).await.unwrap();
    handle.wait().await;

    let mut loaded = store.state(|s| s.loaded.clone()).await;
    loaded.sort_unstable();
    assert_eq!(loaded, vec!["a", "b"]);
}

#[tokio::test]
async fn sequential_effects_run_in_order() {
    let store = test_store();

    let mut handle = store.send(TestAction::RunSteps).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(store.state(|s| s.steps.clone()).await, vec![1, 2]);
}

#[tokio::test]
async fn consecutive_sends_see_previous_state() {
    let store = test_store();

    for value in [1, 2, 3] {
        let mut handle = store.send(TestAction::Save { value }).await.unwrap();
        handle.wait().await;
    }

    assert_eq!(store.state(|s| s.local.clone()).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn effect_actions_are_broadcast_but_sent_actions_are_not() {
    let store = test_store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(TestAction::Save { value: 1 }).await.unwrap();
    handle.wait().await;

    let mut seen = Vec::new();
    while let Ok(action) = rx.try_recv() {
        seen.push(action);
    }

    assert_eq!(
        seen,
        vec![
            TestAction::Saved { value: 1 },
            TestAction::Reload,
            TestAction::Reloaded { values: vec![1] },
        ]
    );
}

#[tokio::test]
async fn send_and_wait_for_returns_matching_action() {
    let store = test_store();

    let action = store
        .send_and_wait_for(
            TestAction::Save { value: 9 },
            |a| matches!(a, TestAction::Reloaded { .. }),
            Duration::from_secs(2),
        )
        .await
        .unwrap();

    assert_eq!(action, TestAction::Reloaded { values: vec![9] });
}

#[tokio::test]
async fn send_and_wait_for_times_out() {
    let store = test_store();

    let result = store
        .send_and_wait_for(
            TestAction::Noop,
            |a| matches!(a, TestAction::Reloaded { .. }),
            Duration::from_millis(30),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

#[tokio::test]
async fn shutdown_rejects_new_actions() {
    let store = test_store();

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    let result = store.send(TestAction::Noop).await;
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
}

#[tokio::test]
async fn shutdown_times_out_with_slow_effects() {
    let store = Store::new(
        TestState::default(),
        TestReducer,
        TestEnvironment {
            latency: Duration::from_millis(500),
        },
    );

    let _handle = store.send(TestAction::Save { value: 1 }).await.unwrap();
    let result = store.shutdown(Duration::from_millis(30)).await;

    assert!(matches!(result, Err(StoreError::ShutdownTimeout(n)) if n > 0));
}
