//! # veil
//!
//! A redirect gate. Visitors never see the real destination in a link:
//! they land on `/`, pass a referrer and user-agent screen, receive a page
//! carrying a signed token that lives for 30 seconds, and only `/verify`
//! turns that token into the final `302`.
//!
//! ```text
//! browser ── GET / ──────────────▶ 302 /secure-redirect
//!         ── GET /secure-redirect ▶ 200 page{token}        (screened)
//!         ── GET /verify?token= ──▶ 302 REDIRECT_URL       (screened)
//! ```
//!
//! Every access decision is also pushed, fire-and-forget, to a Telegram chat
//! when `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID` are set.
//!
//! The crate carries its own small HTTP layer on hyper: a radix-tree
//! [`Router`] with a [`middleware`] chain in front, and a [`Server`] with
//! graceful shutdown.
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use veil::{Config, Gate, Notifier, RedirectPage, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), veil::Error> {
//!     let config = Config::from_env()?;
//!     let page = RedirectPage::resolve(config.template_path.as_deref())?;
//!     let notifier = Notifier::spawn(config.telegram.clone());
//!     let gate = Arc::new(Gate::new(&config, page, notifier));
//!
//!     Server::bind(([0, 0, 0, 0], config.port).into())
//!         .await?
//!         .serve(gate.router())
//!         .await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod classifier;
pub mod config;
pub mod gate;
pub mod health;
pub mod middleware;
pub mod notify;
pub mod page;
pub mod token;

pub use classifier::{Classifier, Verdict, Visitor};
pub use config::Config;
pub use error::Error;
pub use gate::Gate;
pub use handler::Handler;
pub use method::Method;
pub use notify::Notifier;
pub use page::RedirectPage;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use token::TokenSigner;
