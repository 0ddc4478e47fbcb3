// src/checker/pool.rs
// =============================================================================
// Checks every link on a page with a bounded pool of workers.
//
// How it works:
// 1. All links go into a work queue, which is then closed
// 2. N workers (N = min(max_workers, link count)) pull from the shared queue
//    and hand each link to the prober
// 3. Probe results go onto one result channel
// 4. A coordinator task joins every worker, then closes the result channel
// 5. The aggregator drains the result channel into a LinkAnalysis
//
// Cancellation: a worker stops as soon as the token fires while it waits
// for the next link, while it waits on a probe, or while it waits to
// publish a result. Because the coordinator still joins whatever workers
// exist, the result channel always closes and the aggregator always returns.
// =============================================================================

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use url::Url;

use super::aggregate::LinkTally;
use super::http::LinkProber;
use crate::jobs::{LinkAnalysis, LinkProbeResult};

type WorkQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// Bounded worker pool around a `LinkProber`.
#[derive(Clone)]
pub struct LinkChecker {
    prober: Arc<dyn LinkProber>,
    max_workers: usize,
    span: Span,
}

impl LinkChecker {
    pub fn new(prober: Arc<dyn LinkProber>, max_workers: usize, span: Span) -> Self {
        Self {
            prober,
            max_workers,
            span,
        }
    }

    // Probes `links` against `base` and returns the aggregated counts
    //
    // Zero links returns an empty analysis without spawning anything.
    pub async fn check_links(
        &self,
        links: Vec<String>,
        base: &Url,
        cancel: CancellationToken,
    ) -> LinkAnalysis {
        let link_count = links.len();
        let workers = pool_size(link_count, self.max_workers);
        if workers == 0 {
            return LinkAnalysis::default();
        }

        tracing::debug!(parent: &self.span, link_count, workers, "starting link check");

        let (queue_tx, queue_rx) = mpsc::channel(link_count);
        for link in links {
            // Capacity equals the link count, so this never waits
            if queue_tx.send(link).await.is_err() {
                break;
            }
        }
        drop(queue_tx);
        let queue: WorkQueue = Arc::new(Mutex::new(queue_rx));

        let (results_tx, results_rx) = mpsc::channel(link_count);

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let worker = run_worker(
                Arc::clone(&self.prober),
                Arc::clone(&queue),
                results_tx.clone(),
                base.clone(),
                cancel.clone(),
            );
            pool.spawn(worker.instrument(tracing::debug_span!(parent: &self.span, "link_worker", worker_id)));
        }

        let span = self.span.clone();
        tokio::spawn(async move {
            while let Some(joined) = pool.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(parent: &span, error = %e, "link check worker aborted");
                }
            }
            // Last sender: the aggregator finishes once this is gone
            drop(results_tx);
        });

        let analysis = LinkTally::new(base.clone()).drain(results_rx).await;

        if cancel.is_cancelled() {
            tracing::warn!(
                parent: &self.span,
                link_count,
                checked = analysis.internal + analysis.external,
                "link check cancelled before all links were probed"
            );
        }

        analysis
    }
}

// Number of workers for a page with `link_count` links
pub fn pool_size(link_count: usize, max_workers: usize) -> usize {
    link_count.min(max_workers)
}

async fn run_worker(
    prober: Arc<dyn LinkProber>,
    queue: WorkQueue,
    results: mpsc::Sender<LinkProbeResult>,
    base: Url,
    cancel: CancellationToken,
) {
    loop {
        let link = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = next_link(&queue) => match next {
                Some(link) => link,
                None => break,
            },
        };

        let probed = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            probed = prober.probe(&link, &base) => probed,
        };

        // Skipped links publish nothing
        let Some(result) = probed else {
            continue;
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = results.send(result) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("link check worker stopped");
}

async fn next_link(queue: &WorkQueue) -> Option<String> {
    queue.lock().await.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Prober that answers from the link text, with an optional delay,
    /// and records how many probes overlap.
    struct FakeProber {
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeProber {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LinkProber for FakeProber {
        async fn probe(&self, link: &str, base: &Url) -> Option<LinkProbeResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let url = crate::checker::http::resolve_link(link, base)?;
            let status_code = if link.contains("broken") { 404 } else { 200 };
            Some(LinkProbeResult {
                link: link.to_string(),
                resolved_url: url.to_string(),
                status_code,
                is_accessible: status_code < 400,
            })
        }
    }

    /// Prober that never answers.
    struct HangingProber;

    #[async_trait]
    impl LinkProber for HangingProber {
        async fn probe(&self, _link: &str, _base: &Url) -> Option<LinkProbeResult> {
            std::future::pending().await
        }
    }

    fn base() -> Url {
        Url::parse("http://myapp.test/").unwrap()
    }

    fn checker(prober: Arc<dyn LinkProber>) -> LinkChecker {
        LinkChecker::new(prober, 10, Span::none())
    }

    #[test]
    fn test_pool_size() {
        assert_eq!(pool_size(0, 10), 0);
        assert_eq!(pool_size(3, 10), 3);
        assert_eq!(pool_size(10, 10), 10);
        assert_eq!(pool_size(250, 10), 10);
    }

    #[tokio::test]
    async fn test_no_links_no_probes() {
        let prober = FakeProber::new(Duration::ZERO);
        let analysis = checker(prober.clone())
            .check_links(Vec::new(), &base(), CancellationToken::new())
            .await;

        assert_eq!(analysis, LinkAnalysis::default());
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_counts_exclude_skipped_links() {
        let links = vec![
            "/a".to_string(),
            "/broken".to_string(),
            "http://other.test/x".to_string(),
            "http://other.test/broken".to_string(),
            "".to_string(),
            "#top".to_string(),
            "javascript:void(0)".to_string(),
            "mailto:me@myapp.test".to_string(),
        ];

        let analysis = checker(FakeProber::new(Duration::ZERO))
            .check_links(links, &base(), CancellationToken::new())
            .await;

        assert_eq!(analysis.internal, 2);
        assert_eq!(analysis.external, 2);
        assert_eq!(analysis.internal + analysis.external, 8 - 4);
        assert_eq!(analysis.inaccessible, 2);
        assert_eq!(analysis.inaccessible_details.len(), 2);
        assert!(analysis
            .inaccessible_details
            .iter()
            .all(|detail| detail.status_code == 404 && detail.url.contains("broken")));
    }

    #[tokio::test]
    async fn test_other_schemes_count_as_inaccessible() {
        let config = crate::config::AnalyzerConfig::default();
        let prober = crate::checker::HttpProber::new(&config, Span::none()).unwrap();
        let links = vec![
            "tel:+15555550100".to_string(),
            "ftp://myapp.test/f".to_string(),
            "http://127.0.0.1:1/x".to_string(),
            "mailto:me@myapp.test".to_string(),
        ];

        let analysis = checker(Arc::new(prober))
            .check_links(links, &base(), CancellationToken::new())
            .await;

        assert_eq!(analysis.internal + analysis.external, 3);
        // ftp:// on the same host stays internal; tel: has no host
        assert_eq!(analysis.internal, 1);
        assert_eq!(analysis.external, 2);
        assert_eq!(analysis.inaccessible, 3);
        assert!(analysis
            .inaccessible_details
            .iter()
            .all(|detail| detail.status_code == 0));
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_ten() {
        let prober = FakeProber::new(Duration::from_millis(20));
        let links: Vec<String> = (0..35).map(|i| format!("/page/{i}")).collect();

        let analysis = checker(prober.clone())
            .check_links(links, &base(), CancellationToken::new())
            .await;

        assert_eq!(analysis.internal, 35);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 35);
        assert!(prober.max_in_flight.load(Ordering::SeqCst) <= 10);
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_link_count() {
        let prober = FakeProber::new(Duration::from_millis(20));
        let links: Vec<String> = (0..3).map(|i| format!("/page/{i}")).collect();

        checker(prober.clone())
            .check_links(links, &base(), CancellationToken::new())
            .await;

        assert!(prober.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_cancel_mid_probe_terminates() {
        let links: Vec<String> = (0..50).map(|i| format!("/page/{i}")).collect();
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let analysis = tokio::time::timeout(
            Duration::from_secs(5),
            checker(Arc::new(HangingProber)).check_links(links, &base(), cancel),
        )
        .await
        .expect("pool should stop after cancellation");

        assert_eq!(analysis, LinkAnalysis::default());
    }

    #[tokio::test]
    async fn test_already_cancelled_probes_nothing() {
        let prober = FakeProber::new(Duration::ZERO);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let links: Vec<String> = (0..20).map(|i| format!("/page/{i}")).collect();
        let analysis = checker(prober.clone())
            .check_links(links, &base(), cancel)
            .await;

        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
        assert_eq!(analysis.internal + analysis.external, 0);
    }
}
