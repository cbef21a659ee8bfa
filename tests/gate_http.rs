//! End-to-end tests against a real listening gate.

use std::collections::HashMap;
use std::env::VarError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use veil::{Config, Gate, Notifier, RedirectPage, Server, TokenSigner};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const TARGET: &str = "https://example.com/page";
const SECRET: &str = "integration-secret";

struct TestGate {
    addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestGate {
    async fn start(vars: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        vars.entry("REDIRECT_URL".into()).or_insert_with(|| TARGET.into());
        vars.entry("REDIRECT_SECRET".into()).or_insert_with(|| SECRET.into());

        let config = Config::from_reader(|k| vars.get(k).cloned().ok_or(VarError::NotPresent))
            .expect("valid test config");
        let notifier = Notifier::spawn(config.telegram.clone());
        let gate = Arc::new(Gate::new(&config, RedirectPage::builtin(), notifier));

        let server = Server::bind(([127, 0, 0, 1], 0).into()).await.expect("bind");
        let addr = server.local_addr();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.serve_with_shutdown(gate.router(), async move {
            let _ = rx.await;
        }));

        Self { addr, _shutdown: tx }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

fn client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(user_agent)
        .build()
        .unwrap()
}

fn extract_token(html: &str) -> String {
    let start = html.find("/verify?token=").expect("token link") + "/verify?token=".len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

#[tokio::test]
async fn browser_walks_through_to_the_target() {
    let gate = TestGate::start(&[]).await;
    let http = client(FIREFOX);

    let res = http.get(gate.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"], "/secure-redirect");

    let res = http.get(gate.url("/secure-redirect")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/html"));
    let token = extract_token(&res.text().await.unwrap());

    let res = http
        .get(gate.url(&format!("/verify?token={token}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"], TARGET);
}

#[tokio::test]
async fn verify_rejects_missing_expired_and_tampered_tokens() {
    let gate = TestGate::start(&[]).await;
    let http = client(FIREFOX);

    let res = http.get(gate.url("/verify")).send().await.unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.text().await.unwrap(), "Missing token");

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let expired = TokenSigner::new(SECRET).issue_at(TARGET, now - 31).unwrap();
    let res = http
        .get(gate.url(&format!("/verify?token={expired}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let expired_body = res.text().await.unwrap();

    let fresh = TokenSigner::new(SECRET).issue(TARGET).unwrap();
    let mut bytes = fresh.into_bytes();
    let i = bytes.len() - 5;
    bytes[i] = if bytes[i] == b'x' { b'y' } else { b'x' };
    let tampered = String::from_utf8(bytes).unwrap();
    let res = http
        .get(gate.url(&format!("/verify?token={tampered}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // Expiry and tampering are indistinguishable to the client.
    assert_eq!(res.text().await.unwrap(), expired_body);
    assert_eq!(expired_body, "Unauthorized: invalid or expired token");
}

#[tokio::test]
async fn health_answers_even_for_bot_user_agents() {
    let gate = TestGate::start(&[("ALLOWED_REF", "https://partner.example")]).await;

    let res = client("curl/8.5.0").get(gate.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client("curl/8.5.0").get(gate.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 403);
}

#[tokio::test]
async fn foreign_referrer_is_forbidden_but_absent_referrer_is_not() {
    let gate = TestGate::start(&[("ALLOWED_REF", "https://partner.example")]).await;
    let http = client(FIREFOX);

    let res = http
        .get(gate.url("/secure-redirect"))
        .header("referer", "https://elsewhere.example/")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert_eq!(res.text().await.unwrap(), "Forbidden: bad referrer");

    let res = http.get(gate.url("/secure-redirect")).send().await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn every_verdict_is_reported_to_the_sink() {
    let sink = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&sink)
        .await;

    let sink_url = sink.uri();
    let gate = TestGate::start(&[
        ("TELEGRAM_TOKEN", "TOKEN"),
        ("TELEGRAM_CHAT_ID", "777"),
        ("TELEGRAM_API_URL", sink_url.as_str()),
    ])
    .await;

    let res = client("python-requests/2.31").get(gate.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 403);
    let res = client(FIREFOX).get(gate.url("/verify")).send().await.unwrap();
    assert_eq!(res.status(), 400);

    // Screening of /verify (allowed) plus the missing-token report.
    let mut texts = Vec::new();
    for _ in 0..100 {
        texts = sink
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                assert_eq!(body["chat_id"], "777");
                body["text"].as_str().unwrap().to_owned()
            })
            .collect::<Vec<_>>();
        if texts.len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(texts.len(), 3, "{texts:?}");
    assert!(texts.iter().any(|t| t.starts_with("❌ Blocked (bot UA)") && t.contains("UA: python-requests/2.31")));
    assert!(texts.iter().any(|t| t.starts_with("✅ Allowed") && t.contains("Ref: none")));
    assert!(texts.iter().any(|t| t.starts_with("❌ Blocked (missing token)")));
}

#[tokio::test]
async fn unreachable_sink_does_not_change_responses() {
    // Port 9 (discard) is closed on loopback in test environments.
    let gate = TestGate::start(&[
        ("TELEGRAM_TOKEN", "TOKEN"),
        ("TELEGRAM_CHAT_ID", "1"),
        ("TELEGRAM_API_URL", "http://127.0.0.1:9"),
    ])
    .await;
    let quiet = TestGate::start(&[]).await;

    for path in ["/", "/secure-redirect", "/verify", "/verify?token=bogus", "/healthz"] {
        let noisy = client(FIREFOX).get(gate.url(path)).send().await.unwrap();
        let baseline = client(FIREFOX).get(quiet.url(path)).send().await.unwrap();
        assert_eq!(noisy.status(), baseline.status(), "{path}");

        // The secure page embeds a fresh token, so only compare fixed bodies.
        if path != "/secure-redirect" {
            assert_eq!(noisy.text().await.unwrap(), baseline.text().await.unwrap(), "{path}");
        }
    }
}
