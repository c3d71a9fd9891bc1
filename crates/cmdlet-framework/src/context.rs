//! # Invocation Context
//!
//! The [`InvocationContext`] is the per-call value bag: the bound parameters,
//! the ambient settings (region, credential reference), the output selector
//! and the force flag. It is produced by a [`ContextBuilder`] and frozen from
//! then on; nothing downstream can change it.

use crate::operation::Operation;
use crate::param::{Diagnostic, Requirements};
use crate::select::Selector;
use std::fmt;
use tracing::warn;

/// Target region name (e.g. `us-east-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a set of credentials (a profile name).
///
/// The pipeline only forwards it to the client factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialRef(String);

impl CredentialRef {
    pub fn profile(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CredentialRef {
    fn default() -> Self {
        Self::profile("default")
    }
}

impl fmt::Display for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "profile:{}", self.0)
    }
}

/// Settings that apply to an invocation but are not operation parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ambient {
    pub region: Option<Region>,
    pub credentials: CredentialRef,
}

type Hook<P> = Box<dyn FnOnce(&mut P) + Send>;

/// Builds an [`InvocationContext`] from bound parameters.
///
/// Hooks registered with [`pre_hook`](Self::pre_hook) run before required
/// parameters are checked, [`post_hook`](Self::post_hook)s after. Both run in
/// registration order.
pub struct ContextBuilder<P> {
    params: P,
    ambient: Ambient,
    selector: Option<Selector>,
    force: bool,
    pre: Vec<Hook<P>>,
    post: Vec<Hook<P>>,
}

impl<P> ContextBuilder<P> {
    pub fn new(params: P) -> Self {
        Self {
            params,
            ambient: Ambient::default(),
            selector: None,
            force: false,
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    pub fn ambient(mut self, ambient: Ambient) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn region(mut self, region: Region) -> Self {
        self.ambient.region = Some(region);
        self
    }

    pub fn credentials(mut self, credentials: CredentialRef) -> Self {
        self.ambient.credentials = credentials;
        self
    }

    /// Overrides the operation's default selector.
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Skips the confirmation gate for this invocation.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn pre_hook(mut self, hook: impl FnOnce(&mut P) + Send + 'static) -> Self {
        self.pre.push(Box::new(hook));
        self
    }

    pub fn post_hook(mut self, hook: impl FnOnce(&mut P) + Send + 'static) -> Self {
        self.post.push(Box::new(hook));
        self
    }

    /// Freezes the context for operation `O`.
    ///
    /// Missing or blank required parameters are logged and recorded as
    /// diagnostics; construction itself never fails.
    pub fn build<O>(self) -> InvocationContext<P>
    where
        O: Operation<Params = P> + ?Sized,
    {
        let mut params = self.params;
        for hook in self.pre {
            hook(&mut params);
        }

        let mut requirements = Requirements::new();
        O::requirements(&params, &mut requirements);
        let diagnostics = requirements.into_diagnostics();
        for diagnostic in &diagnostics {
            warn!(operation = O::NAME, parameter = diagnostic.parameter, "{}", diagnostic);
        }

        for hook in self.post {
            hook(&mut params);
        }

        InvocationContext {
            params,
            ambient: self.ambient,
            selector: self.selector,
            force: self.force,
            diagnostics,
        }
    }
}

/// Immutable per-call value bag.
#[derive(Debug)]
pub struct InvocationContext<P> {
    params: P,
    ambient: Ambient,
    selector: Option<Selector>,
    force: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<P> InvocationContext<P> {
    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn ambient(&self) -> &Ambient {
        &self.ambient
    }

    pub fn region(&self) -> Option<&Region> {
        self.ambient.region.as_ref()
    }

    pub fn credentials(&self) -> &CredentialRef {
        &self.ambient.credentials
    }

    /// The caller's selector, if one was given.
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
