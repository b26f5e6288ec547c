use crate::config::SelectorConfig;
use crate::error::{CrawlError, LoadPhase};
use crate::navigator::PageNavigator;
use crate::results::CrawlEnd;
use crate::tests::support::*;
use url::Url;

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator(renderer: StaticRenderer, max_pages: Option<usize>) -> PageNavigator<StaticRenderer> {
        PageNavigator::new(
            renderer,
            Url::parse(START_URL).unwrap(),
            &SelectorConfig::default(),
            max_pages,
        )
        .unwrap()
    }

    /// Drains the navigator, returning the URL and item count of each page
    async fn drain(nav: &mut PageNavigator<StaticRenderer>) -> Vec<(String, usize)> {
        let mut pages = Vec::new();
        while let Some(page) = nav.next_page().await.unwrap() {
            pages.push((page.url().to_string(), page.items().len()));
        }
        pages
    }

    #[tokio::test]
    async fn test_stops_at_empty_page() {
        let renderer = StaticRenderer::new()
            .with_page(
                START_URL,
                listing(
                    &[card("A", Some("1 RWF"), None), card("B", None, None)],
                    Some("/product-category/?id=B33&page=2"),
                ),
            )
            .with_page(
                PAGE_2_URL,
                listing(
                    &[card("C", None, None)],
                    Some("/product-category/?id=B33&page=3"),
                ),
            )
            .with_page(PAGE_3_URL, listing(&[], Some("/product-category/?id=B33&page=4")));
        let probe = renderer.probe();
        let mut nav = navigator(renderer, None);

        let pages = drain(&mut nav).await;
        assert_eq!(
            pages,
            vec![(START_URL.to_string(), 2), (PAGE_2_URL.to_string(), 1)]
        );
        assert_eq!(
            nav.end(),
            Some(&CrawlEnd::EmptyPage(Url::parse(PAGE_3_URL).unwrap()))
        );
        assert_eq!(probe.rendered().len(), 3);
        assert_eq!(nav.pages_emitted(), 2);
    }

    #[tokio::test]
    async fn test_stops_without_next_link() {
        let renderer = StaticRenderer::new().with_page(
            START_URL,
            listing(&[card("Only", Some("5 RWF"), Some("/product/only"))], None),
        );
        let probe = renderer.probe();
        let mut nav = navigator(renderer, None);

        let pages = drain(&mut nav).await;
        assert_eq!(pages, vec![(START_URL.to_string(), 1)]);
        assert_eq!(nav.end(), Some(&CrawlEnd::NoNextLink));
        assert_eq!(probe.rendered(), vec![START_URL.to_string()]);

        // Exhausted navigators stay exhausted without touching the renderer
        assert!(nav.next_page().await.unwrap().is_none());
        assert_eq!(probe.rendered().len(), 1);
    }

    #[tokio::test]
    async fn test_next_link_is_resolved_against_current_page() {
        let renderer = StaticRenderer::new()
            .with_page(
                START_URL,
                listing(&[card("A", None, None)], Some("?id=B33&page=2")),
            )
            .with_page(
                PAGE_2_URL,
                listing(&[card("B", None, None)], Some("https://kasha.rw/product-category/?id=B33&page=3")),
            )
            .with_page(PAGE_3_URL, listing(&[card("C", None, None)], None));
        let probe = renderer.probe();
        let mut nav = navigator(renderer, None);

        let first = nav.next_page().await.unwrap().unwrap();
        assert_eq!(first.next_href(), Some("?id=B33&page=2"));
        drop(first);

        drain(&mut nav).await;
        assert_eq!(
            probe.rendered(),
            vec![
                START_URL.to_string(),
                PAGE_2_URL.to_string(),
                PAGE_3_URL.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_cycle_is_detected() {
        let renderer = StaticRenderer::new()
            .with_page(
                START_URL,
                listing(&[card("A", None, None)], Some("/product-category/?id=B33&page=2")),
            )
            .with_page(
                PAGE_2_URL,
                listing(&[card("B", None, None)], Some("/product-category/?id=B33#products")),
            );
        let probe = renderer.probe();
        let mut nav = navigator(renderer, None);

        let pages = drain(&mut nav).await;
        assert_eq!(pages.len(), 2);
        match nav.end() {
            Some(CrawlEnd::CycleDetected(url)) => {
                assert_eq!(url.as_str(), "https://kasha.rw/product-category/?id=B33#products")
            }
            other => panic!("expected cycle detection, got {:?}", other),
        }
        assert_eq!(probe.rendered().len(), 2);
    }

    #[tokio::test]
    async fn test_self_referencing_next_link() {
        let renderer = StaticRenderer::new().with_page(
            START_URL,
            listing(&[card("A", None, None)], Some(START_URL)),
        );
        let mut nav = navigator(renderer, None);

        assert_eq!(drain(&mut nav).await.len(), 1);
        assert!(matches!(nav.end(), Some(CrawlEnd::CycleDetected(_))));
    }

    #[tokio::test]
    async fn test_page_limit() {
        let renderer = StaticRenderer::new()
            .with_page(
                START_URL,
                listing(&[card("A", None, None)], Some("/product-category/?id=B33&page=2")),
            )
            .with_page(
                PAGE_2_URL,
                listing(&[card("B", None, None)], Some("/product-category/?id=B33&page=3")),
            );
        let probe = renderer.probe();
        let mut nav = navigator(renderer, Some(1));

        assert_eq!(drain(&mut nav).await.len(), 1);
        assert_eq!(nav.end(), Some(&CrawlEnd::PageLimit(1)));
        assert_eq!(probe.rendered().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_landmark_is_fatal() {
        let renderer = StaticRenderer::new()
            .with_page(
                START_URL,
                listing(&[card("A", None, None)], Some("/product-category/?id=B33&page=2")),
            )
            .with_fixture(PAGE_2_URL, FixturePage::MissingLandmark);
        let mut nav = navigator(renderer, None);

        assert!(nav.next_page().await.unwrap().is_some());
        match nav.next_page().await {
            Err(CrawlError::NavigationTimeout { url, phase, .. }) => {
                assert_eq!(url, PAGE_2_URL);
                assert_eq!(phase, LoadPhase::Landmark);
            }
            Err(other) => panic!("expected navigation timeout, got {}", other),
            Ok(_) => panic!("expected navigation timeout"),
        }
    }

    #[tokio::test]
    async fn test_close_releases_renderer() {
        let renderer = StaticRenderer::new();
        let probe = renderer.probe();
        let mut nav = navigator(renderer, None);

        nav.close().await;
        assert!(probe.closed());
        assert!(nav.next_page().await.unwrap().is_none());
        assert!(probe.rendered().is_empty());
    }
}
