//! Line-oriented shell over the check-in store.
//!
//! The `checkin` binary reads one [`Command`] per line, turns it into
//! actions and prints [`render`] of the resulting state.

use crate::actions::{
    CheckinAction, ConfirmationAction, EventsAction, LoginAction, ScanAction, SearchAction,
    SessionAction,
};
use crate::state::{CheckinState, ConfirmationView, Route};
use checkin_api::{Id, RegistrationResource, SearchParameter};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

/// Help text listing every command.
pub const HELP: &str = "\
commands:
  login <email> <password>   sign in
  remember on|off            keep the next session across restarts
  events                     list events
  select <event-id>          make an event active
  scan <code>                feed a scanned code
  focus | blur               scanner screen shown / hidden
  search <text>              search registrations of the active event
  param <name>               bib_number | identification_number | code
  pick <n>                   open search result n
  confirm                    confirm the open registration
  back                       back to the scanner
  logout                     sign out
  state                      print the current state
  quit                       exit";

/// Invalid shell input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command word.
    #[error("unknown command: {0} (type `help`)")]
    Unknown(String),

    /// Missing or malformed arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// One shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `login <email> <password>`
    Login {
        /// Email
        email: String,
        /// Password
        password: String,
    },
    /// `remember on|off`
    Remember(bool),
    /// `events`
    Events,
    /// `select <event-id>`
    Select(Id),
    /// `scan <code>`
    Scan(String),
    /// `focus`
    Focus,
    /// `blur`
    Blur,
    /// `search <text>`
    Search(String),
    /// `param <name>`
    Param(SearchParameter),
    /// `pick <n>`, 1-based
    Pick(usize),
    /// `confirm`
    Confirm,
    /// `back`
    Back,
    /// `logout`
    Logout,
    /// `state`
    State,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match word {
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(email), Some(password), None) => Self::Login {
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                    _ => return Err(CommandError::Usage("login <email> <password>")),
                }
            },
            "remember" => match rest {
                "on" => Self::Remember(true),
                "off" => Self::Remember(false),
                _ => return Err(CommandError::Usage("remember on|off")),
            },
            "events" => Self::Events,
            "select" if !rest.is_empty() => Self::Select(Id::new(rest)),
            "select" => return Err(CommandError::Usage("select <event-id>")),
            "scan" if !rest.is_empty() => Self::Scan(rest.to_string()),
            "scan" => return Err(CommandError::Usage("scan <code>")),
            "focus" => Self::Focus,
            "blur" => Self::Blur,
            // Blank searches are sent on purpose so the form reports them
            "search" => Self::Search(rest.to_string()),
            "param" => rest
                .parse()
                .map(Self::Param)
                .map_err(|_| CommandError::Usage("param bib_number|identification_number|code"))?,
            "pick" => match rest.parse::<usize>() {
                Ok(n) if n > 0 => Self::Pick(n),
                _ => return Err(CommandError::Usage("pick <n> (1-based)")),
            },
            "confirm" => Self::Confirm,
            "back" => Self::Back,
            "logout" => Self::Logout,
            "state" | "" => Self::State,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

impl Command {
    /// Actions this command sends, in order.
    #[must_use]
    pub fn into_actions(self) -> Vec<CheckinAction> {
        match self {
            Self::Login { email, password } => vec![LoginAction::Submit { email, password }.into()],
            Self::Remember(on) => vec![SessionAction::SetRememberMe(on).into()],
            Self::Events => vec![
                CheckinAction::Navigate(Route::EventSelection),
                EventsAction::Load.into(),
            ],
            Self::Select(id) => vec![EventsAction::Select { id }.into()],
            Self::Scan(value) => vec![ScanAction::CodeScanned { value }.into()],
            Self::Focus => vec![ScanAction::FocusGained.into()],
            Self::Blur => vec![ScanAction::FocusLost.into()],
            Self::Search(query) => vec![
                CheckinAction::Navigate(Route::Search),
                SearchAction::QueryChanged(query).into(),
                SearchAction::Submit.into(),
            ],
            Self::Param(parameter) => vec![SearchAction::ParameterChanged(parameter).into()],
            Self::Pick(n) => vec![SearchAction::SelectResult { index: n.saturating_sub(1) }.into()],
            Self::Confirm => vec![ConfirmationAction::Confirm.into()],
            Self::Back => vec![ConfirmationAction::BackToScan.into()],
            Self::Logout => vec![SessionAction::ClearSession.into()],
            Self::State | Self::Help | Self::Quit => Vec::new(),
        }
    }
}

/// Human-readable summary of what the current screen shows.
#[must_use]
pub fn render(state: &CheckinState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{:?}]", state.route);

    if let Some(profile) = &state.app.profile {
        let _ = writeln!(out, "signed in as {} <{}>", profile.name, profile.email);
    }
    if let Some(event) = &state.app.event {
        let _ = writeln!(out, "event: {} ({})", event.name, event.id);
    }

    match state.route {
        Route::Splash => out.push_str("restoring session...\n"),
        Route::Login => {
            if state.login.loading {
                out.push_str("signing in...\n");
            }
            if let Some(notice) = &state.login.notice {
                let _ = writeln!(out, "{notice}");
            }
            if let Some(error) = &state.login.error {
                let _ = writeln!(out, "error: {error}");
            }
        },
        Route::EventSelection => {
            if state.app.events_loading {
                out.push_str("loading events...\n");
            }
            for event in &state.app.events {
                let _ = writeln!(out, "  {}  {}", event.id, event.name);
            }
            if let Some(error) = &state.app.events_error {
                let _ = writeln!(out, "error: {error}");
            }
        },
        Route::Scan => {
            let _ = writeln!(out, "scanner: {:?}", state.scan.phase);
            if let Some(error) = &state.scan.error {
                let _ = writeln!(out, "error: {error}");
            }
        },
        Route::Search => {
            let _ = writeln!(
                out,
                "search by {}: {:?}",
                state.search.parameter.label(),
                state.search.query
            );
            if state.search.loading {
                out.push_str("searching...\n");
            }
            for (n, registration) in state.search.results.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", n + 1, summary(registration));
            }
            if state.search.searched && state.search.results.is_empty() && state.search.error.is_none() {
                out.push_str("no registrations found\n");
            }
            if let Some(error) = &state.search.error {
                let _ = writeln!(out, "error: {error}");
            }
        },
        Route::Confirmation => match state.confirmation_view() {
            ConfirmationView::Invalid => out.push_str("nothing to confirm; `back` to scan\n"),
            ConfirmationView::Ready {
                registration,
                loading,
                error,
            } => {
                let _ = writeln!(out, "{}", summary(registration));
                for field in [
                    registration.course.as_ref().and_then(|c| c.name.as_deref()).map(|v| ("course", v)),
                    registration.category.as_ref().and_then(|c| c.name.as_deref()).map(|v| ("category", v)),
                    registration.team.as_ref().and_then(|t| t.name.as_deref()).map(|v| ("team", v)),
                    registration.status.as_deref().map(|v| ("status", v)),
                ]
                .into_iter()
                .flatten()
                {
                    let _ = writeln!(out, "  {}: {}", field.0, field.1);
                }
                for extra in &registration.extras {
                    let _ = writeln!(out, "  extra {}: {}", extra.kind, extra.value);
                }
                if registration.check_in {
                    out.push_str("  already checked in\n");
                }
                if loading {
                    out.push_str("confirming...\n");
                }
                if let Some(error) = error {
                    let _ = writeln!(out, "error: {error}");
                }
            },
        },
    }
    out
}

fn summary(registration: &RegistrationResource) -> String {
    match registration.bib_number {
        Some(bib) => format!("#{bib} {}", registration.athlete_name()),
        None => registration.athlete_name(),
    }
}
