//! Route table: path → method → action.
//!
//! # Design Decisions
//! - Exact string paths only
//! - At most one action per (path, method); re-registering overwrites
//! - Lookup is exact method first, then the `*` wildcard

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use thiserror::Error;

use crate::routing::action::Action;

/// Errors raised while registering routes.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),
}

/// Method key of a route: an exact verb or the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Exact(Method),
    /// Matches any method not registered explicitly for the path.
    Any,
}

impl FromStr for RouteMethod {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(RouteMethod::Any);
        }
        Method::from_bytes(s.as_bytes())
            .map(RouteMethod::Exact)
            .map_err(|_| RouteError::InvalidMethod(s.to_string()))
    }
}

impl From<Method> for RouteMethod {
    fn from(method: Method) -> Self {
        RouteMethod::Exact(method)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMethod::Exact(method) => write!(f, "{}", method),
            RouteMethod::Any => write!(f, "*"),
        }
    }
}

/// Two-level lookup table owned by the router.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, HashMap<RouteMethod, Action>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `action` under (path, method), replacing any previous entry.
    /// Returns true when an existing entry was replaced.
    pub fn insert(&mut self, method: RouteMethod, path: impl Into<String>, action: Action) -> bool {
        self.routes
            .entry(path.into())
            .or_default()
            .insert(method, action)
            .is_some()
    }

    /// Exact method first, wildcard second.
    pub fn resolve(&self, path: &str, method: &Method) -> Option<&Action> {
        let methods = self.routes.get(path)?;
        methods
            .get(&RouteMethod::Exact(method.clone()))
            .or_else(|| methods.get(&RouteMethod::Any))
    }

    /// Registered paths, sorted for deterministic binding.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Number of (path, method) entries.
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
