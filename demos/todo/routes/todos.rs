use axum::http::{header, HeaderValue, StatusCode};
use routedir::{handler, Context, Endpoints, HandlerResult, HttpError, Reply};
use serde::Deserialize;

use crate::store::Store;

#[derive(Deserialize)]
struct NewTodo {
    title: String,
}

#[derive(Deserialize)]
struct TodoPatch {
    title: Option<String>,
    done: Option<bool>,
}

pub fn endpoints() -> Endpoints {
    let store = Store::default();

    Endpoints::new()
        .priority(1)
        .middleware(handler(no_store))
        .get("/", {
            let store = store.clone();
            handler(move |_ctx| list(store.clone()))
        })
        .post("/", {
            let store = store.clone();
            handler(move |ctx| create(store.clone(), ctx))
        })
        .get("/:id", {
            let store = store.clone();
            handler(move |ctx| show(store.clone(), ctx))
        })
        .patch("/:id", {
            let store = store.clone();
            handler(move |ctx| update(store.clone(), ctx))
        })
        .delete("/:id", handler(move |ctx| remove(store.clone(), ctx)))
}

async fn no_store(ctx: Context) -> HandlerResult {
    ctx.response()
        .insert_header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(Reply::Empty)
}

fn todo_id(ctx: &Context) -> Result<u64, HttpError> {
    ctx.param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| HttpError::bad_request("INVALID_ID"))
}

async fn list(store: Store) -> HandlerResult {
    Reply::json(store.list())
}

async fn create(store: Store, ctx: Context) -> HandlerResult {
    let new: NewTodo = ctx.body_as()?;
    if new.title.trim().is_empty() {
        return Err(HttpError::unprocessable("TITLE_REQUIRED").into());
    }
    ctx.response().set_status(StatusCode::CREATED);
    Reply::json(store.insert(new.title))
}

async fn show(store: Store, ctx: Context) -> HandlerResult {
    let todo = store
        .get(todo_id(&ctx)?)
        .ok_or_else(|| HttpError::not_found("TODO_NOT_FOUND"))?;
    Reply::json(todo)
}

async fn update(store: Store, ctx: Context) -> HandlerResult {
    let patch: TodoPatch = ctx.body_as()?;
    let todo = store
        .update(todo_id(&ctx)?, patch.title, patch.done)
        .ok_or_else(|| HttpError::not_found("TODO_NOT_FOUND"))?;
    Reply::json(todo)
}

async fn remove(store: Store, ctx: Context) -> HandlerResult {
    store
        .remove(todo_id(&ctx)?)
        .ok_or_else(|| HttpError::not_found("TODO_NOT_FOUND"))?;
    Ok(Reply::Empty)
}
