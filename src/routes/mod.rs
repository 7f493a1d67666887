mod health;
mod redirects;
mod subscribe;
mod unsubscribe;
mod verify;

pub use health::*;
pub use redirects::*;
pub use subscribe::*;
pub use unsubscribe::*;
pub use verify::*;

/// Query string of the links sent to subscribers. Handlers take it as an
/// `Option` so an unparseable query is treated like a missing token.
#[derive(serde::Deserialize)]
pub struct TokenParameters {
    token: Option<String>,
}

impl TokenParameters {
    /// The token, unless it is absent or blank.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
