//! Authorization guard.
//!
//! Checks the caller's [`AuthContext`], carried in the arguments, before
//! delegation. A denied caller gets a [`WrapError::Forbidden`] and the
//! wrapped callable is never invoked. Arguments without a context are
//! denied as well.
//!
//! # Modes
//!
//! - [`Authorize::capability`]: the caller must hold a named capability
//! - [`Authorize::callers`]: the caller must be on an allow-list
//! - [`Authorize::custom`]: a [`PolicyEvaluator`] decides
//!
//! # Example
//!
//! ```
//! use heron_combinators::{require_capability, Combinator};
//! use heron_core::{AuthContext, Metadata, SyncCallable, WrapError};
//!
//! let delete: SyncCallable<(AuthContext, u64), (), WrapError> =
//!     SyncCallable::new(Metadata::new("delete_post"), |_| Ok(()));
//! let guarded = require_capability("delete").wrap_sync(delete);
//!
//! let admin = AuthContext::new("Feng").with_capability("delete");
//! assert_eq!(guarded.call((admin, 7)), Ok(()));
//!
//! let reader = AuthContext::new("alice").with_capability("read");
//! assert!(matches!(
//!     guarded.call((reader, 7)),
//!     Err(WrapError::Forbidden { .. })
//! ));
//! ```

use crate::combinator::{Combinator, LayerKind};
use crate::wrapper::Wrapper;
use heron_core::{AsyncCallable, AuthContext, CarriesAuthContext, SyncCallable, WrapError};
use std::collections::BTreeSet;
use std::sync::Arc;

const LAYER: &str = "authorization";

/// Custom policy evaluator.
pub trait PolicyEvaluator: Send + Sync + std::fmt::Debug {
    /// Decides whether `context` may invoke `callable`.
    fn evaluate(&self, context: &AuthContext, callable: &str) -> PolicyDecision;
}

/// Policy evaluation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The call may proceed.
    Allow,
    /// The call is rejected.
    Deny {
        /// The reason for denial.
        reason: String,
    },
}

impl PolicyDecision {
    /// Creates a denial.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum AuthorizationMode {
    Capability(String),
    Callers(Arc<BTreeSet<String>>),
    Custom(Arc<dyn PolicyEvaluator>),
}

/// Rejects callers that fail the configured check.
#[derive(Debug, Clone)]
pub struct Authorize {
    mode: AuthorizationMode,
}

impl Authorize {
    /// Requires the caller to hold `capability`.
    pub fn capability(capability: impl Into<String>) -> Self {
        Self {
            mode: AuthorizationMode::Capability(capability.into()),
        }
    }

    /// Requires the caller to be one of `callers`.
    pub fn callers<I>(callers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            mode: AuthorizationMode::Callers(Arc::new(
                callers.into_iter().map(Into::into).collect(),
            )),
        }
    }

    /// Delegates the decision to `evaluator`.
    pub fn custom<P: PolicyEvaluator + 'static>(evaluator: P) -> Self {
        Self {
            mode: AuthorizationMode::Custom(Arc::new(evaluator)),
        }
    }

    /// Evaluates the check for `context` invoking `callable`.
    pub fn evaluate(&self, context: &AuthContext, callable: &str) -> PolicyDecision {
        match &self.mode {
            AuthorizationMode::Capability(capability) => {
                if context.has(capability) {
                    PolicyDecision::Allow
                } else {
                    PolicyDecision::deny(format!("missing capability '{capability}'"))
                }
            }
            AuthorizationMode::Callers(allowed) => {
                if allowed.contains(context.caller()) {
                    PolicyDecision::Allow
                } else {
                    PolicyDecision::deny("caller is not on the allow-list")
                }
            }
            AuthorizationMode::Custom(evaluator) => evaluator.evaluate(context, callable),
        }
    }

    fn wrapper<A, T, E>(&self) -> Wrapper<A, T, E>
    where
        A: CarriesAuthContext + 'static,
        T: 'static,
        E: From<WrapError> + 'static,
    {
        let guard = self.clone();
        Wrapper::new(LAYER)
            .with_kind(LayerKind::Authorization)
            .before(move |meta, args: &A| {
                let Some(context) = args.auth_context() else {
                    tracing::warn!(callable = meta.name(), "call without authorization context");
                    return Err(WrapError::forbidden(
                        meta.name(),
                        "unknown",
                        "no authorization context",
                    )
                    .into());
                };
                match guard.evaluate(context, meta.name()) {
                    PolicyDecision::Allow => Ok(()),
                    PolicyDecision::Deny { reason } => {
                        tracing::warn!(
                            callable = meta.name(),
                            caller = context.caller(),
                            reason = %reason,
                            "authorization denied"
                        );
                        Err(WrapError::forbidden(meta.name(), context.caller(), reason).into())
                    }
                }
            })
    }
}

/// Requires the caller to hold `capability`.
pub fn require_capability(capability: impl Into<String>) -> Authorize {
    Authorize::capability(capability)
}

impl<A, T, E> Combinator<A, T, E> for Authorize
where
    A: CarriesAuthContext + Send + 'static,
    T: Send + 'static,
    E: From<WrapError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        LAYER
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Authorization
    }

    fn wrap_sync(&self, inner: SyncCallable<A, T, E>) -> SyncCallable<A, T, E> {
        self.wrapper().wrap_sync(inner)
    }

    fn wrap_async(&self, inner: AsyncCallable<A, T, E>) -> AsyncCallable<A, T, E> {
        self.wrapper().wrap_async(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::Metadata;
    use heron_test::{CallCounter, TestError};

    fn delete_post(counter: &CallCounter) -> SyncCallable<(AuthContext, u64), u64, TestError> {
        let counter = counter.clone();
        SyncCallable::new(Metadata::new("delete_post"), move |(_, id)| {
            counter.hit();
            Ok(id)
        })
    }

    #[test]
    fn test_missing_capability_is_forbidden() {
        let counter = CallCounter::new();
        let wrapped = require_capability("delete").wrap_sync(delete_post(&counter));

        let reader = AuthContext::new("alice").with_capability("read");
        let err = wrapped.call((reader, 1)).unwrap_err();

        assert_eq!(
            err,
            TestError::Wrap(WrapError::forbidden(
                "delete_post",
                "alice",
                "missing capability 'delete'"
            ))
        );
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_capability_holder_is_allowed() {
        let counter = CallCounter::new();
        let wrapped = require_capability("delete").wrap_sync(delete_post(&counter));

        let admin = AuthContext::new("Feng").with_capabilities(["read", "delete"]);
        assert_eq!(wrapped.call((admin, 42)), Ok(42));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_caller_allow_list() {
        let counter = CallCounter::new();
        let guard = Authorize::callers(["Feng", "John", "Mike", "Jennie"]);
        let wrapped = guard.wrap_sync(delete_post(&counter));

        assert_eq!(wrapped.call((AuthContext::new("John"), 3)), Ok(3));
        assert!(matches!(
            wrapped.call((AuthContext::new("Hacker"), 3)),
            Err(TestError::Wrap(WrapError::Forbidden { .. }))
        ));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_missing_context_is_forbidden() {
        let counter = CallCounter::new();
        let hits = counter.clone();
        let read: SyncCallable<(Option<AuthContext>, u64), u64, TestError> =
            SyncCallable::new(Metadata::new("read_post"), move |(_, id)| {
                hits.hit();
                Ok(id)
            });
        let wrapped = require_capability("read").wrap_sync(read);

        let err = wrapped.call((None, 9)).unwrap_err();
        assert!(matches!(
            err,
            TestError::Wrap(WrapError::Forbidden { ref reason, .. }) if reason == "no authorization context"
        ));
        assert_eq!(counter.count(), 0);
    }

    #[derive(Debug)]
    struct BusinessHours;

    impl PolicyEvaluator for BusinessHours {
        fn evaluate(&self, context: &AuthContext, callable: &str) -> PolicyDecision {
            if context.has("on-call") || callable.starts_with("read") {
                PolicyDecision::Allow
            } else {
                PolicyDecision::deny("outside business hours")
            }
        }
    }

    #[tokio::test]
    async fn test_custom_evaluator_async() {
        let counter = CallCounter::new();
        let hits = counter.clone();
        let purge: AsyncCallable<(AuthContext,), (), TestError> =
            AsyncCallable::new(Metadata::new("purge_cache"), move |_| {
                let hits = hits.clone();
                async move {
                    hits.hit();
                    Ok(())
                }
            });
        let wrapped = Authorize::custom(BusinessHours).wrap_async(purge);

        let on_call = AuthContext::new("Mike").with_capability("on-call");
        assert_eq!(wrapped.call((on_call,)).await, Ok(()));
        assert!(wrapped.call((AuthContext::new("Mike"),)).await.is_err());
        assert_eq!(counter.count(), 1);
    }
}
