//! Source probes for resolving the latest available version of a target
//!
//! This module provides:
//! - The [`SourceProbe`] trait all upstream queries implement
//! - A constructor registry keyed by source kind, so new upstream kinds
//!   plug in without touching the engine or existing probes
//! - The built-in probes: apt, GitHub releases, npm registry, git remote
//!   commit, and a generic package-manager fallback
//!
//! A probe returns a typed failure, never "up to date": distinguishing
//! "nothing newer" from "could not check" is the whole point.

mod apt;
mod git;
mod github;
mod npm;
mod package_manager;

pub use apt::AptProbe;
pub use git::GitCommitProbe;
pub use github::GithubReleaseProbe;
pub use npm::NpmRegistryProbe;
pub use package_manager::PackageManagerProbe;

use crate::command::CommandRunner;
use crate::domain::SourceDescriptor;
use crate::error::{ConfigError, ProbeError};
use crate::http::HttpClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// The latest version (or commit) one source knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLatest {
    /// Version string or commit hash
    pub value: String,
    /// True when the value is a commit hash: comparison degenerates to
    /// equality, there is no ordering between hashes
    pub commit: bool,
    /// True when the source classified this candidate as a security fix.
    /// Only the apt probe ever sets this.
    pub security_fix: bool,
    /// Publication time, when the source reports one
    pub published_at: Option<DateTime<Utc>>,
}

impl ResolvedLatest {
    /// A plain orderable version
    pub fn version(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            commit: false,
            security_fix: false,
            published_at: None,
        }
    }

    /// A commit hash (equality-only comparison)
    pub fn commit(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            commit: true,
            security_fix: false,
            published_at: None,
        }
    }

    /// Mark this candidate as a security fix
    pub fn with_security_fix(mut self, security_fix: bool) -> Self {
        self.security_fix = security_fix;
        self
    }

    /// Attach a publication time
    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// Trait for upstream source probes
#[async_trait]
pub trait SourceProbe: Send + Sync + std::fmt::Debug {
    /// Source name for error context and reports
    fn source_name(&self) -> &'static str;

    /// Resolve the latest version this source knows about. Failures are
    /// returned, never thrown past this boundary.
    async fn resolve_latest(&self) -> Result<ResolvedLatest, ProbeError>;
}

/// Constructor for a probe kind: descriptor in, probe out
pub type ProbeConstructor =
    Box<dyn Fn(&SourceDescriptor) -> Result<Box<dyn SourceProbe>, ConfigError> + Send + Sync>;

/// Registry of kind-tagged probe constructors.
///
/// Target descriptors select a probe by string kind; adding an upstream
/// kind means registering one constructor here, nothing else changes.
pub struct ProbeRegistry {
    constructors: HashMap<String, ProbeConstructor>,
}

impl ProbeRegistry {
    /// Empty registry, for tests and embedders that bring their own kinds
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with all built-in probe kinds registered
    pub fn with_defaults(http: HttpClient, runner: Arc<dyn CommandRunner>) -> Self {
        let mut registry = Self::empty();

        {
            let runner = runner.clone();
            registry.register("apt", move |d| {
                AptProbe::from_descriptor(d, runner.clone()).map(|p| Box::new(p) as _)
            });
        }
        {
            let http = http.clone();
            registry.register("github-release", move |d| {
                GithubReleaseProbe::from_descriptor(d, http.clone()).map(|p| Box::new(p) as _)
            });
        }
        {
            let http = http.clone();
            registry.register("npm", move |d| {
                NpmRegistryProbe::from_descriptor(d, http.clone()).map(|p| Box::new(p) as _)
            });
        }
        {
            let runner = runner.clone();
            registry.register("git-commit", move |d| {
                GitCommitProbe::from_descriptor(d, runner.clone()).map(|p| Box::new(p) as _)
            });
        }
        registry.register("package-manager", move |d| {
            PackageManagerProbe::from_descriptor(d, runner.clone()).map(|p| Box::new(p) as _)
        });

        registry
    }

    /// Register a constructor under a kind key. Re-registering a kind
    /// replaces the previous constructor.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(&SourceDescriptor) -> Result<Box<dyn SourceProbe>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(kind.into(), Box::new(constructor));
    }

    /// Whether a kind is registered
    pub fn knows(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds, sorted for stable diagnostics
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build a probe for a descriptor
    pub fn build(&self, descriptor: &SourceDescriptor) -> Result<Box<dyn SourceProbe>, ConfigError> {
        let constructor = self.constructors.get(&descriptor.kind).ok_or_else(|| {
            ConfigError::UnknownSourceKind {
                kind: descriptor.kind.clone(),
            }
        })?;
        constructor(descriptor)
    }
}

/// Fetch a required descriptor parameter or fail with the kind context
pub(crate) fn require_param<'a>(
    value: &'a Option<String>,
    kind: &str,
    param: &str,
) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::missing_parameter(kind, param))
}
