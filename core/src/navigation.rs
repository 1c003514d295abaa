//! Navigation pipeline: resolve a path, run the access stage, derive the
//! document title.
//!
//! Title derivation is a pure function of route metadata. Access is a
//! separate stage behind `AccessGuard`. The shipped `AllowAll` guard admits
//! every navigation: no client-side access control is enforced, and the
//! backend stays the authority. The `requires_auth` / `require_admin` flags
//! are exposed on every match so an enforcing guard can be plugged in.

use crate::routes::{self, RouteMatch, RouteMeta};

pub const APP_TITLE: &str = "电影管理系统";

/// `"{title} - 电影管理系统"`, or the bare application title.
pub fn page_title(meta: &RouteMeta) -> String {
    match meta.title {
        Some(title) => format!("{title} - {APP_TITLE}"),
        None => APP_TITLE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(String),
}

pub trait AccessGuard {
    fn check(&self, target: &RouteMatch<'_>) -> Access;
}

/// Admits every navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessGuard for AllowAll {
    fn check(&self, _target: &RouteMatch<'_>) -> Access {
        Access::Allow
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub target: RouteMatch<'static>,
    pub access: Access,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct Navigator<G = AllowAll> {
    guard: G,
}

impl Navigator {
    pub fn new() -> Self {
        Self { guard: AllowAll }
    }
}

impl<G: AccessGuard> Navigator<G> {
    pub fn with_guard(guard: G) -> Self {
        Self { guard }
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        let target = routes::resolve(path);
        let access = self.guard.check(&target);
        if let Access::Redirect(to) = &access {
            tracing::debug!(route = target.route.name, redirect = %to, "navigation redirected");
        }
        let title = page_title(&target.route.meta);
        Navigation {
            target,
            access,
            title,
        }
    }
}
