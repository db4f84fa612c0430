use crate::error::{PortalError, PortalResult};
use crate::model::{new_id, Book, BookBorrow, BorrowStatus, Entity};
use crate::repo::Repo;
use crate::store::KvStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

/// Books matching a case-insensitive title/author search and an exact
/// category, in stored order.
pub fn list_books(
    store: &dyn KvStore,
    query: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<Vec<Book>> {
    let needle = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    Repo::<Book>::new(store).find_by(|b| {
        let matches_query = needle.as_deref().map_or(true, |q| {
            b.title.to_lowercase().contains(q) || b.author.to_lowercase().contains(q)
        });
        let matches_category = category.map_or(true, |c| b.category == c);
        matches_query && matches_category
    })
}

pub fn categories(store: &dyn KvStore) -> anyhow::Result<Vec<String>> {
    let set: BTreeSet<String> = Repo::<Book>::new(store)
        .list()?
        .into_iter()
        .map(|b| b.category)
        .collect();
    Ok(set.into_iter().collect())
}

/// Lend one copy of a book. Stock is decremented exactly once per borrow.
pub fn borrow(
    store: &dyn KvStore,
    user_id: &str,
    book_id: &str,
    today: NaiveDate,
) -> PortalResult<BookBorrow> {
    let books = Repo::<Book>::new(store);
    let borrows = Repo::<BookBorrow>::new(store);

    let mut book = books
        .get(book_id)?
        .ok_or_else(|| PortalError::not_found("book", book_id))?;
    let already = borrows
        .find_one(|b| {
            b.user_id == user_id && b.book_id == book_id && b.status == BorrowStatus::Borrowed
        })?
        .is_some();
    if already {
        return Err(PortalError::AlreadyBorrowed {
            book_id: book_id.to_string(),
        });
    }
    if book.stock == 0 {
        return Err(PortalError::OutOfStock {
            book_id: book_id.to_string(),
        });
    }

    book.stock -= 1;
    let loan = BookBorrow {
        id: new_id("BB"),
        user_id: user_id.to_string(),
        book_id: book_id.to_string(),
        borrow_date: today,
        return_date: None,
        status: BorrowStatus::Borrowed,
    };
    let books_doc = books.staged_upsert(book.clone())?;
    let borrows_doc = borrows.staged_upsert(loan.clone())?;
    store.set_many(&[
        (Book::KEY, books_doc.as_slice()),
        (BookBorrow::KEY, borrows_doc.as_slice()),
    ])?;
    info!(user_id, book_id, stock = book.stock, borrow_id = %loan.id, "book borrowed");
    Ok(loan)
}

/// Return a loan. Missing or already-returned loans are left untouched.
///
/// Returns the loan as stored after the call, if it exists.
pub fn return_book(
    store: &dyn KvStore,
    borrow_id: &str,
    today: NaiveDate,
) -> anyhow::Result<Option<BookBorrow>> {
    let borrows = Repo::<BookBorrow>::new(store);
    let Some(mut loan) = borrows.get(borrow_id)? else {
        return Ok(None);
    };
    if loan.status == BorrowStatus::Returned {
        return Ok(Some(loan));
    }
    loan.status = BorrowStatus::Returned;
    loan.return_date = Some(today);
    let borrows_doc = borrows.staged_upsert(loan.clone())?;

    let books = Repo::<Book>::new(store);
    // A dangling bookId leaves nothing to restock.
    match books.get(&loan.book_id)? {
        Some(mut book) => {
            book.stock += 1;
            let books_doc = books.staged_upsert(book.clone())?;
            store.set_many(&[
                (BookBorrow::KEY, borrows_doc.as_slice()),
                (Book::KEY, books_doc.as_slice()),
            ])?;
            info!(borrow_id, book_id = %book.id, stock = book.stock, "book returned");
        }
        None => {
            store.set(BookBorrow::KEY, borrows_doc.as_slice())?;
            info!(borrow_id, book_id = %loan.book_id, "book returned; title no longer stocked");
        }
    }
    Ok(Some(loan))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowWithBook {
    #[serde(flatten)]
    pub borrow: BookBorrow,
    pub book: Book,
}

/// A user's loans joined with their book; loans whose book no longer exists
/// are dropped.
pub fn user_borrows(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Vec<BorrowWithBook>> {
    let books = Repo::<Book>::new(store).list()?;
    Ok(Repo::<BookBorrow>::new(store)
        .find_by(|b| b.user_id == user_id)?
        .into_iter()
        .filter_map(|borrow| {
            let book = books.iter().find(|bk| bk.id == borrow.book_id)?.clone();
            Some(BorrowWithBook { borrow, book })
        })
        .collect())
}
