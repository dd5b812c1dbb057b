//! Declarative macros for ergonomic effect construction
//!
//! Almost every effect in the client is "await one remote call, then map the
//! result into an outcome action". These macros remove that boilerplate.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use todosync_core::async_effect;
///
/// async_effect! {
///     auth.sign_out().await;
///     Some(AppAction::SignedOut)
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` that awaits a fallible call and maps both arms
/// into feedback actions
///
/// # Example
///
/// ```rust,ignore
/// use todosync_core::remote_effect;
///
/// remote_effect! {
///     call: queries.add(identity.as_ref(), &title),
///     on_success: |todo| AppAction::TodoAdded { todo },
///     on_error: |error| AppAction::MutationFailed { intent: "add", error }
/// }
/// ```
#[macro_export]
macro_rules! remote_effect {
    (
        call: $call:expr,
        on_success: |$success_param:pat_param| $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $call.await {
                ::std::result::Result::Ok($success_param) => {
                    ::std::option::Option::Some($success_body)
                },
                ::std::result::Result::Err($error_param) => {
                    ::std::option::Option::Some($error_body)
                },
            }
        }))
    };
}
