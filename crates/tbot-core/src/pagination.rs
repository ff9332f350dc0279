//! Cursor-following walk over the registry listing.

use std::time::Duration;

use tokio::time::sleep;

use crate::{
    ports::{PageRequest, TenderSource},
    tender::{PageCursor, TenderSummary},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkSettings {
    pub page_limit: usize,
    pub max_pages: usize,
    /// Pause before each page after the first.
    pub request_delay: Duration,
}

/// Why a walk stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEnd {
    /// The registry returned no cursor (or an empty page).
    Exhausted,
    /// `max_pages` pages were fetched.
    PageLimit,
    /// A fetch failed after the source's own retries.
    Failed(String),
}

/// Lazy, finite, non-restartable sequence of listing pages.
///
/// Each call to [`PageWalker::next_batch`] fetches at most one page. Once the
/// walk has ended every further call returns `None`.
pub struct PageWalker<'a> {
    source: &'a dyn TenderSource,
    settings: WalkSettings,
    cursor: Option<PageCursor>,
    pages: usize,
    end: Option<WalkEnd>,
}

impl<'a> PageWalker<'a> {
    pub fn new(source: &'a dyn TenderSource, settings: WalkSettings) -> Self {
        Self {
            source,
            settings,
            cursor: None,
            pages: 0,
            end: None,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    pub fn end(&self) -> Option<&WalkEnd> {
        self.end.as_ref()
    }

    pub async fn next_batch(&mut self) -> Option<Vec<TenderSummary>> {
        if self.end.is_some() {
            return None;
        }
        if self.pages >= self.settings.max_pages {
            self.end = Some(WalkEnd::PageLimit);
            return None;
        }

        if self.pages > 0 && !self.settings.request_delay.is_zero() {
            sleep(self.settings.request_delay).await;
        }

        let req = PageRequest {
            limit: self.settings.page_limit,
            descending: true,
            offset: self.cursor.take(),
        };

        let page = match self.source.fetch_page(&req).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(page = self.pages + 1, error = %e, "page fetch failed, stopping walk");
                self.end = Some(WalkEnd::Failed(e.to_string()));
                return None;
            }
        };
        self.pages += 1;

        tracing::info!(
            page = self.pages,
            tenders = page.data.len(),
            "fetched listing page"
        );

        match page.next {
            Some(next) if !page.data.is_empty() && !next.as_str().is_empty() => {
                self.cursor = Some(next)
            }
            _ => self.end = Some(WalkEnd::Exhausted),
        }

        Some(page.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page, FakeSource};

    fn settings(max_pages: usize) -> WalkSettings {
        WalkSettings {
            page_limit: 20,
            max_pages,
            request_delay: Duration::ZERO,
        }
    }

    async fn drain(walker: &mut PageWalker<'_>) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        while let Some(batch) = walker.next_batch().await {
            out.push(batch.into_iter().map(|s| s.id).collect());
        }
        out
    }

    #[tokio::test]
    async fn follows_cursor_until_absent() {
        let source = FakeSource::new()
            .with_page(None, page(&["a", "b"], Some("c2")))
            .with_page(Some("c2"), page(&["c"], None));

        let mut walker = PageWalker::new(&source, settings(15));
        let batches = drain(&mut walker).await;

        assert_eq!(batches, vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(walker.end(), Some(&WalkEnd::Exhausted));

        let calls = source.page_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].offset, None);
        assert_eq!(calls[1].offset, Some(PageCursor("c2".to_string())));
        assert!(calls.iter().all(|c| c.descending && c.limit == 20));
    }

    #[tokio::test]
    async fn stops_at_page_ceiling() {
        let source = FakeSource::new()
            .with_page(None, page(&["a"], Some("c2")))
            .with_page(Some("c2"), page(&["b"], Some("c3")))
            .with_page(Some("c3"), page(&["c"], Some("c4")));

        let mut walker = PageWalker::new(&source, settings(2));
        let batches = drain(&mut walker).await;

        assert_eq!(batches.len(), 2);
        assert_eq!(walker.end(), Some(&WalkEnd::PageLimit));
        assert_eq!(source.page_calls().len(), 2);
    }

    #[tokio::test]
    async fn failure_ends_walk_but_keeps_earlier_batches() {
        let source = FakeSource::new()
            .with_page(None, page(&["a"], Some("c2")))
            .with_failing_page(Some("c2"));

        let mut walker = PageWalker::new(&source, settings(15));
        let batches = drain(&mut walker).await;

        assert_eq!(batches, vec![vec!["a"]]);
        assert!(matches!(walker.end(), Some(WalkEnd::Failed(_))));
        assert_eq!(walker.pages_fetched(), 1);
        // Not restartable.
        assert!(walker.next_batch().await.is_none());
        assert_eq!(source.page_calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_page_ends_walk_even_with_cursor() {
        let source = FakeSource::new().with_page(None, page(&[], Some("c2")));

        let mut walker = PageWalker::new(&source, settings(15));
        let batches = drain(&mut walker).await;

        assert_eq!(batches, vec![Vec::<String>::new()]);
        assert_eq!(source.page_calls().len(), 1);
    }
}
