use crate::error::PortalError;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_optional_str, get_required_str, require_store, respond};
use crate::ipc::types::{AppState, Request};
use crate::library::{self, BorrowWithBook};
use crate::model::{BookBorrow, BorrowStatus, Role};
use crate::repo::Repo;
use serde_json::json;

fn books(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_user()?;
    let query = get_optional_str(params, "query");
    let category = get_optional_str(params, "category");
    let list = library::list_books(store, query.as_deref(), category.as_deref())?;
    Ok(json!({ "books": list }))
}

fn categories(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_user()?;
    Ok(json!({ "categories": library::categories(store)? }))
}

fn borrow(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user = state.session.require_user()?;
    let book_id = get_required_str(params, "bookId")?;
    let loan = library::borrow(store, &user.id, &book_id, state.now_local().date())?;
    Ok(json!({ "borrow": loan }))
}

fn return_book(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user = state.session.require_user()?;
    let borrow_id = get_required_str(params, "borrowId")?;
    if let Some(loan) = Repo::<BookBorrow>::new(store).get(&borrow_id)? {
        if loan.user_id != user.id && user.role != Role::Teacher {
            return Err(PortalError::Forbidden {
                required: Role::Teacher,
            }
            .into());
        }
    }
    let loan = library::return_book(store, &borrow_id, state.now_local().date())?;
    Ok(json!({ "borrow": loan }))
}

fn my_borrows(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user = state.session.require_user()?;
    let (active, history): (Vec<BorrowWithBook>, Vec<BorrowWithBook>) =
        library::user_borrows(store, &user.id)?
            .into_iter()
            .partition(|b| b.borrow.status == BorrowStatus::Borrowed);
    Ok(json!({ "active": active, "history": history }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "library.books" => books(state, &req.params),
        "library.categories" => categories(state),
        "library.borrow" => borrow(state, &req.params),
        "library.return" => return_book(state, &req.params),
        "library.myBorrows" => my_borrows(state),
        _ => return None,
    };
    Some(respond(req, result))
}
