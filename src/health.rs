//! Liveness check.
//!
//! | Check | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//!
//! The gate registers it ahead of screening, so health checks sent with `curl` or
//! `wget` are never mistaken for bots.

use crate::{Request, Response};

/// Always returns `200 OK` with body `"ok"`. If the process can respond to
/// HTTP at all, it is alive; this handler has no dependencies.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}
