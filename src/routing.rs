//! Ordered route-pattern registry.
//!
//! Routes are `"<verb> <path>"` strings with `(.*)` captures for path
//! segments, compiled anchored at both ends. Overlapping patterns exist by
//! construction (`post /v1/invoices/(.*)` vs `post /v1/invoices/(.*)/pay`),
//! so registration order is the tie-break: the first registered pattern that
//! matches wins, and handler groups must register literal-suffix routes
//! before catch-all routes sharing a prefix.

use regex::Regex;

use crate::error::{ApiError, ApiResult};
use crate::handlers::Handler;

/// One registered route.
struct Route {
    pattern: Regex,
    name: &'static str,
    handler: Handler,
}

/// The path segments captured by a matched route, passed explicitly into the
/// handler rather than read from ambient state.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    name: &'static str,
    captures: Vec<String>,
}

impl RouteMatch {
    /// The matched handler's registered name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The capture at `index`, counting from the first group in the pattern.
    /// Missing captures resolve to the empty string.
    pub fn capture(&self, index: usize) -> &str {
        self.captures.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Ordered list of route patterns, owned by one engine instance.
#[derive(Default)]
pub struct HandlerRegistry {
    routes: Vec<Route>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. First registered wins when patterns overlap.
    pub fn register(
        &mut self,
        pattern: &str,
        name: &'static str,
        handler: Handler,
    ) -> ApiResult<()> {
        let anchored = format!("^{pattern}$");
        let pattern = Regex::new(&anchored)
            .map_err(|e| ApiError::internal(format!("invalid route pattern {pattern:?}: {e}")))?;
        self.routes.push(Route {
            pattern,
            name,
            handler,
        });
        Ok(())
    }

    /// Resolve a `"<verb> <url>"` string to the first matching route.
    pub fn resolve(&self, method_url: &str) -> Option<(Handler, RouteMatch)> {
        self.routes.iter().find_map(|route| {
            route.pattern.captures(method_url).map(|caps| {
                let captures = caps
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                (
                    route.handler,
                    RouteMatch {
                        name: route.name,
                        captures,
                    },
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
