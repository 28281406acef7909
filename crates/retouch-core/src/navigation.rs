//! Sidebar navigation view model.
//!
//! Presentation is owned by the frontend; this module only decides which links
//! are shown and which one is highlighted for the current route.

use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::{NavLink, NAV_LINKS, PRIMARY_NAV_LINKS, SIGN_IN_ROUTE};

/// Authentication state as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthView {
    SignedIn,
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    pub label: String,
    pub route: String,
    pub icon: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SidebarView {
    pub signed_in: bool,
    /// Transformation links
    pub primary: Vec<NavItem>,
    /// Profile and credits links, followed by the user button
    pub secondary: Vec<NavItem>,
    pub show_user_button: bool,
    /// Present only when signed out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_route: Option<String>,
}

fn nav_item(link: &NavLink, pathname: &str) -> NavItem {
    NavItem {
        label: link.label.to_string(),
        route: link.route.to_string(),
        icon: link.icon.to_string(),
        is_active: link.route == pathname,
    }
}

/// Build the sidebar for `pathname`. Exact route match marks a link active.
pub fn sidebar(pathname: &str, auth: AuthView) -> SidebarView {
    match auth {
        AuthView::SignedIn => {
            let (primary, secondary) = NAV_LINKS.split_at(PRIMARY_NAV_LINKS);
            SidebarView {
                signed_in: true,
                primary: primary.iter().map(|l| nav_item(l, pathname)).collect(),
                secondary: secondary.iter().map(|l| nav_item(l, pathname)).collect(),
                show_user_button: true,
                login_route: None,
            }
        }
        AuthView::SignedOut => SidebarView {
            signed_in: false,
            primary: Vec::new(),
            secondary: Vec::new(),
            show_user_button: false,
            login_route: Some(SIGN_IN_ROUTE.to_string()),
        },
    }
}
