//! Binds to the global prefix itself: `index` collapses to `/`.

use routedir::{handler, Context, Endpoints, HandlerResult, Redirect, Reply};
use serde_json::json;

pub fn endpoints() -> Endpoints {
    Endpoints::new()
        .get("/", handler(info))
        .get("/docs", handler(docs))
}

async fn info(_ctx: Context) -> HandlerResult {
    Reply::json(json!({
        "name": "todo",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn docs(_ctx: Context) -> HandlerResult {
    Ok(Redirect::permanent("/").into())
}
