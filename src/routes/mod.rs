use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AdminError;

/// The six fixed admin actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Index,
    List,
    Create,
    Update,
    Detail,
    Delete,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Index,
        Action::List,
        Action::Create,
        Action::Update,
        Action::Detail,
        Action::Delete,
    ];

    /// Route name used in route specs
    pub fn name(self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Detail => "detail",
            Action::Delete => "delete",
        }
    }

    /// Path the action is mounted on when no override is given
    pub fn default_path(self) -> &'static str {
        match self {
            Action::Index => "/",
            Action::List => "/list/",
            Action::Create => "/create/",
            Action::Update => "/update/",
            Action::Detail => "/detail/",
            Action::Delete => "/delete/",
        }
    }

    /// Whether the action can change stored records
    pub fn is_mutating(self) -> bool {
        matches!(self, Action::Create | Action::Update | Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| AdminError::UnknownRoute(s.to_string()))
    }
}

/// Route name to URL path mapping supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec(BTreeMap<String, String>);

impl Default for RouteSpec {
    fn default() -> Self {
        Action::ALL
            .into_iter()
            .map(|action| (action.name().to_string(), action.default_path().to_string()))
            .collect()
    }
}

impl FromIterator<(String, String)> for RouteSpec {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        RouteSpec(iter.into_iter().collect())
    }
}

impl RouteSpec {
    /// A spec with no routes at all
    pub fn empty() -> Self {
        RouteSpec(BTreeMap::new())
    }

    pub fn with_route(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.0.insert(name.into(), path.into());
        self
    }

    pub fn without_route(mut self, name: &str) -> Self {
        self.0.remove(name);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply overrides written as `list=/browse/,detail=/show/` onto this spec
    pub fn parse_overrides(mut self, overrides: &str) -> Result<Self, AdminError> {
        for entry in overrides.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, path) = entry
                .split_once('=')
                .ok_or_else(|| AdminError::UnknownRoute(entry.to_string()))?;
            let action: Action = name.trim().parse()?;
            self.0.insert(action.name().to_string(), path.trim().to_string());
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
struct Route {
    prefix: String,
    action: Action,
}

/// Bound routes, ordered so the longest prefix is tried first
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Bind a route spec. Every action must have its own path starting with
    /// `/`; names that are not actions are rejected.
    pub fn bind(spec: &RouteSpec) -> Result<Self, AdminError> {
        for name in spec.0.keys() {
            name.parse::<Action>()?;
        }

        let mut seen = HashSet::with_capacity(Action::ALL.len());
        let mut routes = Vec::with_capacity(Action::ALL.len());
        for action in Action::ALL {
            let prefix = spec.get(action.name()).ok_or(AdminError::MissingRoute(action))?;
            if !prefix.starts_with('/') {
                return Err(AdminError::InvalidRoutePath(prefix.to_string()));
            }
            if !seen.insert(prefix) {
                return Err(AdminError::DuplicateRoute(prefix.to_string()));
            }
            routes.push(Route {
                prefix: prefix.to_string(),
                action,
            });
        }
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Ok(Self { routes })
    }

    /// Resolve a mount-relative path to its action and the remainder after the
    /// route prefix. Prefixes ending in `/` match their whole subtree, others
    /// match only exactly.
    pub fn resolve<'p>(&self, path: &'p str) -> Option<(Action, &'p str)> {
        self.routes.iter().find_map(|route| {
            if route.prefix.ends_with('/') {
                path.strip_prefix(route.prefix.as_str())
                    .map(|rest| (route.action, rest))
            } else if path == route.prefix {
                Some((route.action, ""))
            } else {
                None
            }
        })
    }

    /// Bound path prefixes
    pub fn paths(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.prefix.as_str()).collect()
    }

    pub fn path_for(&self, action: Action) -> &str {
        self.routes
            .iter()
            .find(|r| r.action == action)
            .map(|r| r.prefix.as_str())
            .unwrap_or_else(|| action.default_path())
    }
}
