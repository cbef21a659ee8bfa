//! The redirect gate: screening, token issuing and token verification.
//!
//! ```text
//! GET /                 → 302 /secure-redirect
//! GET /secure-redirect  → 200 page with a fresh 30 s token
//! GET /verify?token=…   → 302 <target>   | 400 missing | 401 invalid/expired
//! GET /healthz          → 200 "ok"       (never screened; HEAD too)
//! ```
//!
//! Every other request is screened by [`Screen`] before routing, and every
//! access decision is mirrored to the [`Notifier`].

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::classifier::{Classifier, Verdict, Visitor};
use crate::config::Config;
use crate::health;
use crate::method::Method;
use crate::middleware::Middleware;
use crate::notify::Notifier;
use crate::page::RedirectPage;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::router::Router;
use crate::status::Status;
use crate::token::TokenSigner;

/// Liveness path, exempt from screening.
pub const HEALTH_PATH: &str = "/healthz";

/// Everything a request needs, built once at startup and shared read-only.
pub struct Gate {
    target: Url,
    classifier: Classifier,
    signer: TokenSigner,
    page: RedirectPage,
    notifier: Notifier,
}

impl Gate {
    pub fn new(config: &Config, page: RedirectPage, notifier: Notifier) -> Self {
        Self {
            target: config.redirect_url.clone(),
            classifier: Classifier::new(config.allowed_refs.clone(), &config.extra_bot_signatures),
            signer: TokenSigner::new(&config.secret),
            page,
            notifier,
        }
    }

    /// Routes for the gate, with screening installed as middleware.
    pub fn router(self: Arc<Self>) -> Router {
        let root = |_req: Request| async { Response::redirect("/secure-redirect") };

        let issue = {
            let gate = Arc::clone(&self);
            move |_req: Request| {
                let gate = Arc::clone(&gate);
                async move { gate.secure_redirect() }
            }
        };

        let verify = {
            let gate = Arc::clone(&self);
            move |req: Request| {
                let gate = Arc::clone(&gate);
                async move { gate.verify(&req) }
            }
        };

        Router::new()
            .on(Method::Get, "/", root)
            .on(Method::Get, "/secure-redirect", issue)
            .on(Method::Get, "/verify", verify)
            .on(Method::Get, HEALTH_PATH, health::liveness)
            .layer(Screen(self))
    }

    /// Classifies `req`, reports the verdict, and returns the block response
    /// if the request may not continue.
    pub fn screen(&self, req: &Request) -> Option<Response> {
        let visitor = Visitor::from_request(req);
        let verdict = self.classifier.classify(&visitor);

        self.notifier.notify(visitor.report(verdict));

        if verdict.is_allowed() {
            debug!(ip = %visitor.ip, path = req.path(), "request allowed");
            return None;
        }

        info!(
            ip = %visitor.ip,
            user_agent = %visitor.user_agent,
            referrer = visitor.referrer.as_deref().unwrap_or("none"),
            verdict = ?verdict,
            "request blocked"
        );
        Some(reject(verdict))
    }

    /// Issues a token for the configured target and renders the page.
    pub fn secure_redirect(&self) -> Response {
        match self.signer.issue(self.target.as_str()) {
            Ok(token) => Response::builder()
                .header("cache-control", "no-store")
                .header("referrer-policy", "no-referrer")
                .bytes(ContentType::Html, self.page.render(&token).into_bytes()),
            Err(e) => {
                error!("token signing failed: {e}");
                Response::builder()
                    .status(Status::InternalServerError)
                    .text("Server error")
            }
        }
    }

    /// Verifies `?token=` and redirects to the embedded target.
    pub fn verify(&self, req: &Request) -> Response {
        let ip = req.client_ip();

        let Some(token) = req.query("token").filter(|t| !t.is_empty()) else {
            self.report_token_failure(Verdict::BlockedMissingToken, &ip);
            return reject(Verdict::BlockedMissingToken);
        };

        match self.signer.verify(token) {
            Ok(claims) => {
                info!(%ip, "token accepted, redirecting");
                Response::redirect(&claims.target)
            }
            Err(e) => {
                warn!(%ip, "token rejected: {e}");
                self.report_token_failure(Verdict::BlockedInvalidToken, &ip);
                reject(Verdict::BlockedInvalidToken)
            }
        }
    }

    fn report_token_failure(&self, verdict: Verdict, ip: &str) {
        self.notifier.notify(format!("{}\nIP: {ip}", verdict.label()));
    }
}

fn reject(verdict: Verdict) -> Response {
    Response::builder().status(verdict.status()).text(verdict.message())
}

/// Screening middleware. Skips the liveness check.
pub struct Screen(pub Arc<Gate>);

impl Middleware for Screen {
    fn before(&self, req: &Request) -> Option<Response> {
        if req.path() == HEALTH_PATH {
            return None;
        }
        self.0.screen(req)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    const FIREFOX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

    fn gate(vars: &[(&str, &str)]) -> Arc<Gate> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let config =
            Config::from_reader(|k| vars.get(k).cloned().ok_or(VarError::NotPresent)).unwrap();
        Arc::new(Gate::new(&config, RedirectPage::builtin(), Notifier::disabled()))
    }

    fn browser(target: &str) -> Request {
        Request::new("GET", target).with_header("user-agent", FIREFOX)
    }

    fn body(res: &Response) -> &str {
        std::str::from_utf8(res.body()).unwrap()
    }

    #[tokio::test]
    async fn root_redirects_to_secure_page() {
        let app = gate(&[]).router();
        let res = app.handle(browser("/")).await;
        assert_eq!(res.status_code(), Status::Found);
        assert_eq!(res.header("location"), Some("/secure-redirect"));
    }

    #[tokio::test]
    async fn secure_page_embeds_a_verifiable_token() {
        let app = gate(&[("REDIRECT_URL", "https://example.com/page"), ("REDIRECT_SECRET", "k")])
            .router();
        let res = app.handle(browser("/secure-redirect")).await;
        assert_eq!(res.status_code(), Status::Ok);

        let html = body(&res);
        let start = html.find("/verify?token=").unwrap() + "/verify?token=".len();
        let token: String = html[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .collect();

        let claims = TokenSigner::new("k").verify(&token).unwrap();
        assert_eq!(claims.target, "https://example.com/page");
    }

    #[tokio::test]
    async fn verify_without_token_is_bad_request() {
        let app = gate(&[]).router();
        let res = app.handle(browser("/verify")).await;
        assert_eq!(res.status_code(), Status::BadRequest);
        assert_eq!(body(&res), "Missing token");

        let res = app.handle(browser("/verify?token=")).await;
        assert_eq!(res.status_code(), Status::BadRequest);
    }

    #[tokio::test]
    async fn verify_with_forged_token_is_unauthorized() {
        let app = gate(&[("REDIRECT_SECRET", "real")]).router();
        let forged = TokenSigner::new("guess").issue("https://evil.example").unwrap();

        let res = app.handle(browser(&format!("/verify?token={forged}"))).await;
        assert_eq!(res.status_code(), Status::Unauthorized);
        assert_eq!(body(&res), "Unauthorized: invalid or expired token");
    }

    #[tokio::test]
    async fn verify_with_valid_token_redirects_to_target() {
        let app = gate(&[("REDIRECT_SECRET", "real")]).router();
        let token = TokenSigner::new("real").issue("https://example.com/page").unwrap();

        let res = app.handle(browser(&format!("/verify?token={token}"))).await;
        assert_eq!(res.status_code(), Status::Found);
        assert_eq!(res.header("location"), Some("https://example.com/page"));
    }

    #[tokio::test]
    async fn bots_are_screened_on_every_route_but_health() {
        let app = gate(&[]).router();
        for path in ["/", "/secure-redirect", "/verify?token=x", "/unknown"] {
            let req = Request::new("GET", path).with_header("user-agent", "curl/8.5.0");
            let res = app.handle(req).await;
            assert_eq!(res.status_code(), Status::Forbidden, "{path}");
            assert_eq!(body(&res), "Forbidden: bot detected (UA)");
        }

        let req = Request::new("GET", HEALTH_PATH).with_header("user-agent", "curl/8.5.0");
        let res = app.handle(req).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(body(&res), "ok");
    }

    #[tokio::test]
    async fn foreign_referrer_is_forbidden() {
        let app = gate(&[("ALLOWED_REF", "https://partner.example")]).router();
        let req = browser("/secure-redirect").with_header("referer", "https://evil.example/");
        let res = app.handle(req).await;
        assert_eq!(res.status_code(), Status::Forbidden);
        assert_eq!(body(&res), "Forbidden: bad referrer");

        let req = browser("/secure-redirect").with_header("referer", "https://partner.example/a");
        assert_eq!(app.handle(req).await.status_code(), Status::Ok);
    }

    #[tokio::test]
    async fn health_answers_head_requests() {
        let app = gate(&[]).router();
        let req = Request::new("HEAD", HEALTH_PATH).with_header("user-agent", "curl/8.5.0");
        assert_eq!(app.handle(req).await.status_code(), Status::Ok);
    }

    #[tokio::test]
    async fn signing_failure_is_a_generic_server_error() {
        let gate = Arc::new(Gate {
            signer: TokenSigner::misconfigured(),
            ..Arc::into_inner(gate(&[])).unwrap()
        });

        let res = gate.router().handle(browser("/secure-redirect")).await;
        assert_eq!(res.status_code(), Status::InternalServerError);
        assert_eq!(body(&res), "Server error");
    }
}
