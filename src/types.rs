use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Backend user identifier (`id` in the `/api/me/` payload).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Short-lived bearer credential.
///
/// Held in memory only. `Debug` is redacted so the token never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Long-lived refresh credential read from the `refresh_token` cookie.
///
/// Deliberately not `Serialize`: it travels in cookies and in the
/// token-exchange request body, never in a payload handed to the client.
#[derive(Clone, PartialEq, Eq, From, Into)]
pub struct RefreshToken(String);

impl RefreshToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken(..)")
    }
}

/// Identity returned by the `/api/me/` endpoint.
///
/// Replaced wholesale on every resolution, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<time::OffsetDateTime>,
}

impl UserProfile {
    /// Create a profile with only the required `id`.
    #[must_use]
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: None,
            phone: None,
            balance: 0.0,
            api_key: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = balance;
        self
    }
}

/// An access token together with the profile it was minted for.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Authenticated {
    pub access_token: AccessToken,
    pub user: UserProfile,
}

impl Authenticated {
    #[must_use]
    pub fn new(access_token: AccessToken, user: UserProfile) -> Self {
        Self { access_token, user }
    }
}

/// Current session: either empty or fully authenticated.
///
/// A token without a profile (or the reverse) is unrepresentable. On the wire
/// this is `{"accessToken": .., "user": ..}` with both `null` when signed out;
/// payloads with only one side present are rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "SessionWire", into = "SessionWire")]
pub struct Session(Option<Authenticated>);

impl Session {
    /// The signed-out session.
    #[must_use]
    pub fn empty() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn authenticated(access_token: AccessToken, user: UserProfile) -> Self {
        Self(Some(Authenticated::new(access_token, user)))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.0.as_ref().map(|a| &a.access_token)
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.0.as_ref().map(|a| &a.user)
    }

    #[must_use]
    pub fn as_authenticated(&self) -> Option<&Authenticated> {
        self.0.as_ref()
    }
}

impl From<Authenticated> for Session {
    fn from(auth: Authenticated) -> Self {
        Self(Some(auth))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionWire {
    #[serde(default)]
    access_token: Option<AccessToken>,
    #[serde(default)]
    user: Option<UserProfile>,
}

impl TryFrom<SessionWire> for Session {
    type Error = Error;

    fn try_from(wire: SessionWire) -> Result<Self, Self::Error> {
        match (wire.access_token, wire.user) {
            (Some(access_token), Some(user)) => Ok(Self::authenticated(access_token, user)),
            (None, None) => Ok(Self::empty()),
            _ => Err(Error::PartialSession),
        }
    }
}

impl From<Session> for SessionWire {
    fn from(session: Session) -> Self {
        match session.0 {
            Some(Authenticated { access_token, user }) => Self {
                access_token: Some(access_token),
                user: Some(user),
            },
            None => Self {
                access_token: None,
                user: None,
            },
        }
    }
}
