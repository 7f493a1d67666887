/// Why a verification link could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum VerifyErrorReason {
    MissingToken,
    InvalidToken,
    Error,
}

/// Result pages on the public dashboard that link handlers redirect to.
#[derive(Debug, Clone)]
pub struct RedirectPages {
    dashboard_url: String,
}

impl RedirectPages {
    pub fn new(dashboard_url: impl Into<String>) -> Self {
        Self {
            dashboard_url: dashboard_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn verify_success(&self, already: bool) -> String {
        self.page("verify-success.html", already.then_some("already=true"))
    }

    pub fn verify_error(&self, reason: VerifyErrorReason) -> String {
        self.page("verify-error.html", Some(&format!("reason={reason}")))
    }

    pub fn unsubscribe_success(&self, already: bool) -> String {
        self.page("unsubscribe-success.html", already.then_some("already=true"))
    }

    fn page(&self, page: &str, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("{}/{}?{}", self.dashboard_url, page, query),
            None => format!("{}/{}", self.dashboard_url, page),
        }
    }
}
