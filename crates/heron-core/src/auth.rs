//! Authorization context supplied by callers.
//!
//! An [`AuthContext`] names the caller and the capabilities granted to it. It
//! is passed in with the arguments at invocation time; guards read it but
//! never own it.
//!
//! Guards find the context through [`CarriesAuthContext`], implemented for a
//! bare context and for tuples whose first element carries one.
//!
//! # Example
//!
//! ```
//! use heron_core::{AuthContext, CarriesAuthContext};
//!
//! let ctx = AuthContext::new("Feng").with_capabilities(["read", "write"]);
//! let args = (ctx, "dev.bronze".to_string());
//!
//! let found = args.auth_context().unwrap();
//! assert_eq!(found.caller(), "Feng");
//! assert!(found.has("write"));
//! assert!(!found.has("delete"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Caller identity plus its granted capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AuthContext {
    caller: String,
    #[serde(default)]
    capabilities: BTreeSet<String>,
}

impl AuthContext {
    /// Creates a context for `caller` with no capabilities.
    #[must_use]
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Creates an anonymous context.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    /// Grants one capability.
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Grants several capabilities.
    #[must_use]
    pub fn with_capabilities<I>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Grants a capability in place.
    pub fn grant(&mut self, capability: impl Into<String>) {
        self.capabilities.insert(capability.into());
    }

    /// Revokes a capability. Returns whether it was granted.
    pub fn revoke(&mut self, capability: &str) -> bool {
        self.capabilities.remove(capability)
    }

    /// Returns the caller identity.
    #[must_use]
    pub fn caller(&self) -> &str {
        &self.caller
    }

    /// Whether `capability` is granted.
    #[must_use]
    pub fn has(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns the granted capabilities in sorted order.
    #[must_use]
    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }
}

/// Argument values that expose an authorization context.
pub trait CarriesAuthContext {
    /// Returns the carried context, if any.
    fn auth_context(&self) -> Option<&AuthContext>;
}

impl CarriesAuthContext for AuthContext {
    fn auth_context(&self) -> Option<&AuthContext> {
        Some(self)
    }
}

impl CarriesAuthContext for Arc<AuthContext> {
    fn auth_context(&self) -> Option<&AuthContext> {
        Some(self.as_ref())
    }
}

impl<C: CarriesAuthContext> CarriesAuthContext for Option<C> {
    fn auth_context(&self) -> Option<&AuthContext> {
        self.as_ref().and_then(CarriesAuthContext::auth_context)
    }
}

macro_rules! first_element_carries {
    ($($rest:ident),*) => {
        impl<C: CarriesAuthContext, $($rest),*> CarriesAuthContext for (C, $($rest,)*) {
            fn auth_context(&self) -> Option<&AuthContext> {
                self.0.auth_context()
            }
        }
    };
}

first_element_carries!();
first_element_carries!(B);
first_element_carries!(B, D);
first_element_carries!(B, D, F);
first_element_carries!(B, D, F, G);
