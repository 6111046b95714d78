//! Iterate over messages matching a search and optionally clear their
//! starred or unread status.
//!
//! Messages are handled one at a time in search order. A status is
//! cleared as soon as the handler asks for it, so an error part way
//! through leaves earlier messages cleared and later ones untouched.

use anyhow::Result;
use async_trait::async_trait;

use super::host::MailStore;
use super::models::Message;

pub const DEFAULT_QUERY: &str = "in:inbox";
pub const DEFAULT_LIMIT: usize = 10;

#[async_trait]
pub trait MessageHandler: Send {
    /// Returning `true` asks for the message's status to be cleared when
    /// used with [`process_starred`] or [`process_unread`].
    async fn handle(&mut self, message: &Message) -> Result<bool>;
}

#[async_trait]
impl<F> MessageHandler for F
where
    F: FnMut(&Message) -> bool + Send,
{
    async fn handle(&mut self, message: &Message) -> Result<bool> {
        Ok(self(message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Starred,
    Unread,
}

impl Status {
    fn predicate(&self) -> &'static str {
        match self {
            Status::Starred => "is:starred",
            Status::Unread => "is:unread",
        }
    }

    fn is_set(&self, message: &Message) -> bool {
        match self {
            Status::Starred => message.starred,
            Status::Unread => message.unread,
        }
    }

    async fn clear(&self, store: &dyn MailStore, message: &Message) -> Result<()> {
        match self {
            Status::Starred => store.unstar(message).await,
            Status::Unread => store.mark_read(message).await,
        }
    }
}

/// Call `handler` for every message of every thread matching `query`.
/// Returns the number of messages visited.
pub async fn for_each_message(
    store: &dyn MailStore,
    query: Option<&str>,
    limit: Option<usize>,
    handler: &mut dyn MessageHandler,
) -> Result<usize> {
    let query = query.unwrap_or(DEFAULT_QUERY);
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    let threads = store.search(query, 0, limit).await?;

    let mut visited = 0;
    for thread in threads.iter() {
        for message in thread.messages.iter() {
            handler.handle(message).await?;
            visited += 1;
        }
    }
    tracing::debug!("Visited {} messages for query: {}", visited, query);

    Ok(visited)
}

/// Handle starred, non-trashed messages and unstar each one the handler
/// returns `true` for. Returns the number of messages unstarred.
pub async fn process_starred(
    store: &dyn MailStore,
    query: Option<&str>,
    limit: Option<usize>,
    handler: &mut dyn MessageHandler,
) -> Result<usize> {
    process_with_status(store, Status::Starred, query, limit, handler).await
}

/// Handle unread, non-trashed messages and mark each one the handler
/// returns `true` for as read. Returns the number of messages marked.
pub async fn process_unread(
    store: &dyn MailStore,
    query: Option<&str>,
    limit: Option<usize>,
    handler: &mut dyn MessageHandler,
) -> Result<usize> {
    process_with_status(store, Status::Unread, query, limit, handler).await
}

async fn process_with_status(
    store: &dyn MailStore,
    status: Status,
    query: Option<&str>,
    limit: Option<usize>,
    handler: &mut dyn MessageHandler,
) -> Result<usize> {
    let query = with_predicate(query.unwrap_or(DEFAULT_QUERY), status.predicate());
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    let threads = store.search(&query, 0, limit).await?;

    let mut cleared = 0;
    for thread in threads.iter() {
        for message in thread.messages.iter() {
            if !status.is_set(message) || message.trashed {
                continue;
            }
            if handler.handle(message).await? {
                status.clear(store, message).await?;
                cleared += 1;
            }
        }
    }
    tracing::debug!("Cleared {:?} on {} messages", status, cleared);

    Ok(cleared)
}

fn with_predicate(query: &str, predicate: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        predicate.to_string()
    } else {
        format!("{} {}", query, predicate)
    }
}
