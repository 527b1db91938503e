use crate::models::User;
use crate::session::Session;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    SignedIn,
    Admin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardState {
    Loading,
    Authenticated(User),
    Unauthenticated,
}

impl GuardState {
    pub fn of(session: &Session) -> Self {
        if session.is_loading() {
            return GuardState::Loading;
        }
        match (session.user(), session.is_authenticated()) {
            (Some(user), true) => GuardState::Authenticated(user.clone()),
            _ => GuardState::Unauthenticated,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Show the loading indicator.
    Loading,
    /// Show the guarded view.
    Render(User),
    Redirect(&'static str),
}

/// Gates a view on session state. Every session maps to exactly one outcome.
#[derive(Debug, Clone, Copy)]
pub struct RouteGuard {
    requirement: Requirement,
}

impl RouteGuard {
    pub fn new(requirement: Requirement) -> Self {
        Self { requirement }
    }

    pub fn decide(&self, session: &Session) -> GuardOutcome {
        match GuardState::of(session) {
            GuardState::Loading => GuardOutcome::Loading,
            GuardState::Unauthenticated => GuardOutcome::Redirect(LOGIN_PATH),
            GuardState::Authenticated(user) => match self.requirement {
                Requirement::Admin if !user.is_admin => GuardOutcome::Redirect(HOME_PATH),
                _ => GuardOutcome::Render(user),
            },
        }
    }
}
