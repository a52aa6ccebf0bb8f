//! Login state tracking.

use crate::decoder::ResponseStatus;
use crate::error::SubsonicError;
use crate::types::ApiErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of the most recent login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoginState {
    /// No ping has completed since the last login attempt started
    Unknown,
    LoggedIn,
    /// The server could not be reached or did not answer over HTTP
    BadServer,
    BadCredentials,
    Unlicensed,
    OtherError,
}

impl LoginState {
    /// Map the outcome of a `ping` to a login state.
    pub fn from_ping(outcome: &Result<ResponseStatus, SubsonicError>) -> Self {
        match outcome {
            Err(e) if e.is_transport() => LoginState::BadServer,
            Err(_) => LoginState::OtherError,
            Ok(ResponseStatus::Ok) => LoginState::LoggedIn,
            Ok(ResponseStatus::Failed { code, .. }) => match code.map(ApiErrorCode::from) {
                Some(ApiErrorCode::MissingParameter | ApiErrorCode::BadCredentials) => {
                    LoginState::BadCredentials
                }
                Some(ApiErrorCode::Unlicensed) => LoginState::Unlicensed,
                _ => LoginState::OtherError,
            },
        }
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LoginState::Unknown => "unknown",
            LoginState::LoggedIn => "logged in",
            LoginState::BadServer => "bad server",
            LoginState::BadCredentials => "bad credentials",
            LoginState::Unlicensed => "unlicensed",
            LoginState::OtherError => "other error",
        };
        f.write_str(text)
    }
}

/// Identifies one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTicket(u64);

/// Session-scoped login state machine.
///
/// Every login attempt resets the state to [`LoginState::Unknown`] and hands
/// out a ticket. Only the ping belonging to the latest ticket may move the
/// state on; completions of superseded attempts are dropped.
#[derive(Debug)]
pub struct SessionState {
    state: LoginState,
    generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            state: LoginState::Unknown,
            generation: 0,
        }
    }

    pub fn current(&self) -> LoginState {
        self.state
    }

    pub fn begin_login(&mut self) -> LoginTicket {
        self.generation += 1;
        self.state = LoginState::Unknown;
        LoginTicket(self.generation)
    }

    /// Apply a ping outcome. Returns the new state, or `None` if the ticket
    /// is stale.
    pub fn complete(
        &mut self,
        ticket: LoginTicket,
        outcome: &Result<ResponseStatus, SubsonicError>,
    ) -> Option<LoginState> {
        if ticket.0 != self.generation {
            return None;
        }
        self.state = LoginState::from_ping(outcome);
        Some(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(code: i32) -> Result<ResponseStatus, SubsonicError> {
        Ok(ResponseStatus::Failed {
            code: Some(code),
            message: None,
        })
    }

    #[test]
    fn test_initial_state_is_unknown() {
        assert_eq!(SessionState::new().current(), LoginState::Unknown);
    }

    #[test]
    fn test_ping_mapping() {
        assert_eq!(LoginState::from_ping(&Ok(ResponseStatus::Ok)), LoginState::LoggedIn);
        assert_eq!(LoginState::from_ping(&failed(10)), LoginState::BadCredentials);
        assert_eq!(LoginState::from_ping(&failed(40)), LoginState::BadCredentials);
        assert_eq!(LoginState::from_ping(&failed(60)), LoginState::Unlicensed);
        assert_eq!(LoginState::from_ping(&failed(0)), LoginState::OtherError);
        assert_eq!(LoginState::from_ping(&failed(70)), LoginState::OtherError);
        assert_eq!(
            LoginState::from_ping(&Ok(ResponseStatus::Failed {
                code: None,
                message: None
            })),
            LoginState::OtherError
        );
    }

    #[test]
    fn test_transport_failure_is_bad_server() {
        let outcome = Err(SubsonicError::ServerUnreachable("refused".into()));
        assert_eq!(LoginState::from_ping(&outcome), LoginState::BadServer);

        let outcome = Err(SubsonicError::HttpStatus { status: 404 });
        assert_eq!(LoginState::from_ping(&outcome), LoginState::BadServer);
    }

    #[test]
    fn test_malformed_response_is_other_error() {
        let outcome = Err(SubsonicError::Malformed("not xml".into()));
        assert_eq!(LoginState::from_ping(&outcome), LoginState::OtherError);
    }

    #[test]
    fn test_login_resets_to_unknown() {
        let mut session = SessionState::new();
        let ticket = session.begin_login();
        assert_eq!(session.complete(ticket, &Ok(ResponseStatus::Ok)), Some(LoginState::LoggedIn));

        session.begin_login();
        assert_eq!(session.current(), LoginState::Unknown);
    }

    #[test]
    fn test_stale_ping_is_ignored() {
        let mut session = SessionState::new();
        let old = session.begin_login();
        let new = session.begin_login();

        assert_eq!(session.complete(old, &failed(40)), None);
        assert_eq!(session.current(), LoginState::Unknown);

        assert_eq!(session.complete(new, &Ok(ResponseStatus::Ok)), Some(LoginState::LoggedIn));
    }
}
