//! Resource Fetcher
//!
//! Walks paginated listings page by page and counts the items on each page.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;

/// One listing call against one service endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest<'a> {
    pub service: &'a str,
    pub sdk_method: &'a str,
    pub region: &'a str,
    /// Account ID restricting results to resources the caller owns
    pub owner: Option<&'a str>,
}

/// Result of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub item_count: usize,
    pub next_token: Option<String>,
}

impl Page {
    pub fn new(item_count: usize, next_token: Option<&str>) -> Self {
        Self {
            item_count,
            // Some APIs send "" instead of omitting the token
            next_token: next_token
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string()),
        }
    }

    /// A page with no continuation
    pub fn last(item_count: usize) -> Self {
        Self::new(item_count, None)
    }
}

/// Something that can answer listing calls one page at a time
#[async_trait]
pub trait ListingBackend: Send + Sync {
    async fn list_page(&self, request: &ListRequest<'_>, page_token: Option<&str>) -> Result<Page>;
}

/// Count every item of a listing (auto-paginate)
pub async fn count_listing<B>(backend: &B, request: &ListRequest<'_>) -> Result<u64>
where
    B: ListingBackend + ?Sized,
{
    let mut total: u64 = 0;
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;
    let mut seen_tokens: HashSet<String> = HashSet::new();

    loop {
        let page = backend
            .list_page(request, page_token.as_deref())
            .await
            .with_context(|| {
                format!(
                    "Failed to call {}:{} in {}",
                    request.service, request.sdk_method, request.region
                )
            })?;
        pages += 1;
        total += page.item_count as u64;

        match page.next_token {
            None => break,
            Some(next) if !seen_tokens.insert(next.clone()) => {
                return Err(anyhow::anyhow!(
                    "{}:{} in {} returned the same page token twice",
                    request.service,
                    request.sdk_method,
                    request.region
                ));
            }
            Some(next) => page_token = Some(next),
        }
    }

    tracing::debug!(
        "{}:{} in {}: {} items over {} pages",
        request.service,
        request.sdk_method,
        request.region,
        total,
        pages
    );

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves a fixed list of page sizes, chaining tokens "1", "2", ...
    struct PagedBackend {
        sizes: Vec<usize>,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    impl PagedBackend {
        fn new(sizes: &[usize]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                seen_tokens: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ListingBackend for PagedBackend {
        async fn list_page(&self, _: &ListRequest<'_>, page_token: Option<&str>) -> Result<Page> {
            self.seen_tokens
                .lock()
                .unwrap()
                .push(page_token.map(|t| t.to_string()));
            let index: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let next = (index + 1 < self.sizes.len()).then(|| (index + 1).to_string());
            Ok(Page::new(self.sizes[index], next.as_deref()))
        }
    }

    struct StuckBackend;

    #[async_trait]
    impl ListingBackend for StuckBackend {
        async fn list_page(&self, _: &ListRequest<'_>, _: Option<&str>) -> Result<Page> {
            Ok(Page::new(1, Some("again")))
        }
    }

    /// Alternates between two tokens forever
    struct CyclingBackend;

    #[async_trait]
    impl ListingBackend for CyclingBackend {
        async fn list_page(&self, _: &ListRequest<'_>, page_token: Option<&str>) -> Result<Page> {
            let next = if page_token == Some("a") { "b" } else { "a" };
            Ok(Page::new(1, Some(next)))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ListingBackend for FailingBackend {
        async fn list_page(&self, _: &ListRequest<'_>, _: Option<&str>) -> Result<Page> {
            Err(anyhow::anyhow!("AccessDenied"))
        }
    }

    fn request() -> ListRequest<'static> {
        ListRequest {
            service: "lambda",
            sdk_method: "list_functions",
            region: "us-east-1",
            owner: None,
        }
    }

    #[tokio::test]
    async fn test_sums_all_pages() {
        let backend = PagedBackend::new(&[3, 0, 5]);
        let count = count_listing(&backend, &request()).await.unwrap();
        assert_eq!(count, 8);

        let seen = backend.seen_tokens.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![None, Some("1".to_string()), Some("2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_single_empty_page() {
        let backend = PagedBackend::new(&[0]);
        assert_eq!(count_listing(&backend, &request()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repeated_token_is_error() {
        let err = count_listing(&StuckBackend, &request()).await.unwrap_err();
        assert!(err.to_string().contains("same page token"));
    }

    #[tokio::test]
    async fn test_token_cycle_is_error() {
        let err = count_listing(&CyclingBackend, &request()).await.unwrap_err();
        assert!(err.to_string().contains("same page token"));
    }

    #[tokio::test]
    async fn test_error_carries_request_context() {
        let err = count_listing(&FailingBackend, &request()).await.unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("lambda:list_functions in us-east-1"));
        assert!(chain.contains("AccessDenied"));
    }

    #[test]
    fn test_empty_token_means_last_page() {
        assert_eq!(Page::new(4, Some("")), Page::last(4));
    }
}
