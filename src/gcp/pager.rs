//! Paginated resource accessor.
//!
//! Every GCP listing endpoint follows the same contract: each call returns a
//! batch of items plus an optional `nextPageToken`, and the listing is
//! exhausted when the token is absent. This module owns that loop so command
//! code only supplies a page-fetch closure.
//!
//! Invariants upheld here:
//! - every request after the first carries the most recently returned token
//! - a token repeated by the server aborts the listing instead of looping
//! - a missing items field is an empty page, not an error
//! - the cancellation flag is checked before each subsequent page request;
//!   items already yielded stand

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream};
use serde_json::Value;

use super::error::GcpError;

/// Cooperative cancellation flag, checked between page fetches.
/// Cloneable handle; all clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One page of a listing response.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_token: Option<String>,
}

impl Page {
    /// Build a page from a raw listing response, taking items from
    /// `items_field`. A missing or non-array field denotes an empty page.
    /// An empty-string token counts as absent.
    pub fn from_response(response: &Value, items_field: &str) -> Self {
        let items = response
            .get(items_field)
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let next_token = response
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self { items, next_token }
    }
}

/// Fetch every page and buffer all items.
///
/// `fetch_page` is invoked with the token to send (`None` on the first call)
/// and must perform exactly one listing request. Cancellation between pages
/// returns whatever has been accumulated so far, without error.
pub async fn fetch_all<F, Fut>(
    scope: &str,
    cancel: &CancelFlag,
    mut fetch_page: F,
) -> Result<Vec<Value>, GcpError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page, GcpError>>,
{
    let mut all_items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = fetch_page(token.clone()).await?;
        all_items.extend(page.items);

        let next = match page.next_token {
            Some(next) => next,
            None => break,
        };
        if token.as_deref() == Some(next.as_str()) {
            return Err(GcpError::RepeatedPageToken {
                scope: scope.to_string(),
            });
        }
        token = Some(next);

        if cancel.is_cancelled() {
            tracing::debug!("listing of {} cancelled after {} items", scope, all_items.len());
            break;
        }
    }

    Ok(all_items)
}

/// Lazily stream pages as they arrive. The stream is finite and
/// non-restartable; dropping it stops further requests. Cancellation between
/// pages ends the stream cleanly.
pub fn stream_pages<F, Fut>(
    scope: String,
    cancel: CancelFlag,
    fetch_page: F,
) -> impl Stream<Item = Result<Page, GcpError>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page, GcpError>>,
{
    enum State {
        Start,
        Next(String),
        Done,
    }

    stream::try_unfold(
        (State::Start, fetch_page, cancel, scope),
        |(state, mut fetch_page, cancel, scope)| async move {
            let token = match state {
                State::Start => None,
                State::Next(token) => {
                    if cancel.is_cancelled() {
                        tracing::debug!("listing of {} cancelled", scope);
                        return Ok(None);
                    }
                    Some(token)
                }
                State::Done => return Ok(None),
            };

            let page = fetch_page(token.clone()).await?;

            let next_state = match &page.next_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(GcpError::RepeatedPageToken { scope });
                }
                Some(next) => State::Next(next.clone()),
                None => State::Done,
            };

            Ok(Some((page, (next_state, fetch_page, cancel, scope))))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;
    use std::sync::Mutex;

    /// Simulate a server holding `pages` of (items, next_token), recording
    /// which tokens were requested.
    fn server(
        pages: Vec<(Vec<&'static str>, Option<&'static str>)>,
    ) -> (
        Arc<Mutex<Vec<Option<String>>>>,
        impl FnMut(Option<String>) -> futures::future::Ready<Result<Page, GcpError>>,
    ) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let log = requested.clone();
        let mut remaining = pages.into_iter();

        let fetch = move |token: Option<String>| {
            log.lock().unwrap().push(token);
            let (names, next) = remaining.next().expect("more pages requested than served");
            futures::future::ready(Ok(Page {
                items: names.into_iter().map(|n| json!({ "name": n })).collect(),
                next_token: next.map(str::to_string),
            }))
        };

        (requested, fetch)
    }

    #[tokio::test]
    async fn follows_tokens_until_absent() {
        let (requested, fetch) = server(vec![
            (vec!["a1", "a2"], Some("A")),
            (vec!["b1"], Some("B")),
            (vec!["c1", "c2"], None),
        ]);

        let items = fetch_all("my-project", &CancelFlag::new(), fetch)
            .await
            .unwrap();

        let names: Vec<_> = items
            .iter()
            .map(|i| i["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a1", "a2", "b1", "c1", "c2"]);
        assert_eq!(
            *requested.lock().unwrap(),
            vec![None, Some("A".to_string()), Some("B".to_string())]
        );
    }

    #[tokio::test]
    async fn repeated_token_aborts_instead_of_looping() {
        let (requested, fetch) = server(vec![
            (vec!["a"], Some("SAME")),
            (vec!["b"], Some("SAME")),
            (vec!["never"], None),
        ]);

        let err = fetch_all("my-project", &CancelFlag::new(), fetch)
            .await
            .unwrap_err();
        assert!(matches!(err, GcpError::RepeatedPageToken { .. }));
        // the third page must never be requested
        assert_eq!(requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancellation_between_pages_keeps_yielded_items() {
        let cancel = CancelFlag::new();
        let cancel_after_first = cancel.clone();
        let mut calls = 0;

        let items = fetch_all("my-project", &cancel, move |_token| {
            calls += 1;
            // flag set while the first page is in flight
            cancel_after_first.cancel();
            futures::future::ready(Ok(Page {
                items: vec![json!({ "name": format!("item-{calls}") })],
                next_token: Some("MORE".to_string()),
            }))
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn missing_items_field_is_an_empty_page() {
        let page = Page::from_response(&json!({ "nextPageToken": "T" }), "items");
        assert!(page.items.is_empty());
        assert_eq!(page.next_token.as_deref(), Some("T"));

        let last = Page::from_response(&json!({}), "items");
        assert!(last.items.is_empty());
        assert!(last.next_token.is_none());
    }

    #[tokio::test]
    async fn empty_string_token_terminates() {
        let page = Page::from_response(&json!({ "items": [1], "nextPageToken": "" }), "items");
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn stream_yields_pages_in_order() {
        let (_requested, fetch) = server(vec![
            (vec!["a"], Some("A")),
            (vec!["b"], None),
        ]);

        let pages: Vec<Page> =
            stream_pages("my-project".to_string(), CancelFlag::new(), fetch)
                .try_collect()
                .await
                .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].items[0]["name"], "a");
        assert_eq!(pages[1].items[0]["name"], "b");
    }

    #[tokio::test]
    async fn stream_stops_after_cancellation() {
        let cancel = CancelFlag::new();
        let inner = cancel.clone();

        let pages: Vec<Page> = stream_pages("my-project".to_string(), cancel, move |_| {
            inner.cancel();
            futures::future::ready(Ok(Page {
                items: vec![json!({})],
                next_token: Some("MORE".to_string()),
            }))
        })
        .try_collect()
        .await
        .unwrap();

        assert_eq!(pages.len(), 1);
    }
}
