//! Request classification: referrer allow-list and bot user-agents.
//!
//! Rules run in order and the first match wins:
//!
//! 1. A referrer (or origin) is present, an allow-list is configured, and the
//!    referrer starts with none of its prefixes → [`Verdict::BlockedReferrer`].
//! 2. The user-agent contains a known bot signature → [`Verdict::BlockedBot`].
//! 3. Otherwise → [`Verdict::Allowed`].
//!
//! A missing referrer never blocks: direct navigation and privacy-conscious
//! browsers send none.

use crate::request::Request;
use crate::status::Status;

/// Built-in user-agent signatures, matched case-insensitively as substrings
/// (so `Googlebot` and `AhrefsBot` hit `bot`, `Slurp` does not).
pub const BOT_SIGNATURES: &[&str] = &[
    "bot",
    "crawl",
    "spider",
    "scanner",
    "wget",
    "curl",
    "python-requests",
];

/// Outcome of an access decision. Reported, never stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    Allowed,
    BlockedReferrer,
    BlockedBot,
    BlockedMissingToken,
    BlockedInvalidToken,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }

    /// Human-readable label used in notifications and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Allowed             => "✅ Allowed",
            Self::BlockedReferrer     => "❌ Blocked (bad referrer)",
            Self::BlockedBot          => "❌ Blocked (bot UA)",
            Self::BlockedMissingToken => "❌ Blocked (missing token)",
            Self::BlockedInvalidToken => "❌ Blocked (invalid token)",
        }
    }

    /// HTTP status for a blocking verdict; `Ok` for `Allowed`.
    pub fn status(self) -> Status {
        match self {
            Self::Allowed             => Status::Ok,
            Self::BlockedReferrer     => Status::Forbidden,
            Self::BlockedBot          => Status::Forbidden,
            Self::BlockedMissingToken => Status::BadRequest,
            Self::BlockedInvalidToken => Status::Unauthorized,
        }
    }

    /// Client-facing body. Generic on purpose; detail stays in the logs.
    pub fn message(self) -> &'static str {
        match self {
            Self::Allowed             => "",
            Self::BlockedReferrer     => "Forbidden: bad referrer",
            Self::BlockedBot          => "Forbidden: bot detected (UA)",
            Self::BlockedMissingToken => "Missing token",
            Self::BlockedInvalidToken => "Unauthorized: invalid or expired token",
        }
    }
}

/// The request facts the classifier looks at.
#[derive(Clone, Debug, Default)]
pub struct Visitor {
    pub ip: String,
    pub user_agent: String,
    /// `referer`, else `origin`. `None` when neither is sent (or both empty).
    pub referrer: Option<String>,
}

impl Visitor {
    pub fn from_request(req: &Request) -> Self {
        let referrer = req.header("referer")
            .filter(|v| !v.is_empty())
            .or_else(|| req.header("origin").filter(|v| !v.is_empty()))
            .map(str::to_owned);

        Self {
            ip: req.client_ip(),
            user_agent: req.header("user-agent").unwrap_or_default().to_owned(),
            referrer,
        }
    }

    /// Notification text for `verdict`, one field per line.
    pub fn report(&self, verdict: Verdict) -> String {
        format!(
            "{}\nIP: {}\nUA: {}\nRef: {}",
            verdict.label(),
            self.ip,
            self.user_agent,
            self.referrer.as_deref().unwrap_or("none"),
        )
    }
}

/// Referrer and user-agent filter. Immutable once built.
#[derive(Debug, Clone)]
pub struct Classifier {
    allowed_refs: Vec<String>,
    signatures: Vec<String>,
}

impl Classifier {
    /// `extra_signatures` must already be lowercase; they extend [`BOT_SIGNATURES`].
    pub fn new(allowed_refs: Vec<String>, extra_signatures: &[String]) -> Self {
        let signatures = BOT_SIGNATURES.iter()
            .map(|s| (*s).to_owned())
            .chain(extra_signatures.iter().cloned())
            .collect();
        Self { allowed_refs, signatures }
    }

    pub fn classify(&self, visitor: &Visitor) -> Verdict {
        if let Some(referrer) = &visitor.referrer {
            if !self.referrer_allowed(referrer) {
                return Verdict::BlockedReferrer;
            }
        }

        if self.is_bot(&visitor.user_agent) {
            return Verdict::BlockedBot;
        }

        Verdict::Allowed
    }

    fn referrer_allowed(&self, referrer: &str) -> bool {
        self.allowed_refs.is_empty()
            || self.allowed_refs.iter().any(|prefix| referrer.starts_with(prefix.as_str()))
    }

    fn is_bot(&self, user_agent: &str) -> bool {
        let ua = user_agent.to_ascii_lowercase();
        self.signatures.iter().any(|sig| ua.contains(sig.as_str()))
    }
}
