// src/checker/aggregate.rs
// =============================================================================
// Folds probe results into link statistics.
//
// Results arrive in whatever order the workers finish, so every step here is
// a plain count or push: the totals don't depend on arrival order.
// =============================================================================

use tokio::sync::mpsc;
use url::Url;

use super::html::{classify_link, LinkScope};
use crate::jobs::{InaccessibleLink, LinkAnalysis, LinkProbeResult};

/// Running totals over probe results for one page.
#[derive(Debug)]
pub struct LinkTally {
    base: Url,
    analysis: LinkAnalysis,
}

impl LinkTally {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            analysis: LinkAnalysis::default(),
        }
    }

    pub fn record(&mut self, result: LinkProbeResult) {
        match classify_link(&result.link, &self.base) {
            LinkScope::Internal => self.analysis.internal += 1,
            LinkScope::External => self.analysis.external += 1,
        }

        if !result.is_accessible {
            self.analysis.inaccessible += 1;
            self.analysis.inaccessible_details.push(InaccessibleLink {
                url: result.resolved_url,
                status_code: result.status_code,
            });
        }
    }

    // Drains the result stream until every sender is gone
    pub async fn drain(mut self, mut results: mpsc::Receiver<LinkProbeResult>) -> LinkAnalysis {
        while let Some(result) = results.recv().await {
            self.record(result);
        }
        self.finish()
    }

    pub fn finish(self) -> LinkAnalysis {
        self.analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(link: &str, status_code: u16) -> LinkProbeResult {
        let resolved_url = Url::parse("http://myapp.test/")
            .unwrap()
            .join(link)
            .unwrap()
            .to_string();
        LinkProbeResult {
            link: link.to_string(),
            resolved_url,
            status_code,
            is_accessible: status_code != 0 && status_code < 400,
        }
    }

    fn tally(results: Vec<LinkProbeResult>) -> LinkAnalysis {
        let mut tally = LinkTally::new(Url::parse("http://myapp.test/").unwrap());
        for r in results {
            tally.record(r);
        }
        tally.finish()
    }

    #[test]
    fn test_counts() {
        let analysis = tally(vec![
            result("/a", 200),
            result("/b", 404),
            result("http://other.test/c", 0),
            result("http://other.test/d", 301),
        ]);

        assert_eq!(analysis.internal, 2);
        assert_eq!(analysis.external, 2);
        assert_eq!(analysis.inaccessible, 2);
        assert_eq!(
            analysis.inaccessible_details,
            vec![
                InaccessibleLink {
                    url: "http://myapp.test/b".to_string(),
                    status_code: 404
                },
                InaccessibleLink {
                    url: "http://other.test/c".to_string(),
                    status_code: 0
                },
            ]
        );
    }

    #[test]
    fn test_order_does_not_change_totals() {
        let results = vec![
            result("/a", 200),
            result("/b", 500),
            result("http://other.test/c", 200),
        ];
        let mut reversed = results.clone();
        reversed.reverse();

        let forward = tally(results);
        let backward = tally(reversed);
        assert_eq!(forward.internal, backward.internal);
        assert_eq!(forward.external, backward.external);
        assert_eq!(forward.inaccessible, backward.inaccessible);
    }

    #[tokio::test]
    async fn test_drain_stops_when_senders_close() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(result("/a", 200)).await.unwrap();
        tx.send(result("/b", 404)).await.unwrap();
        drop(tx);

        let analysis = LinkTally::new(Url::parse("http://myapp.test/").unwrap())
            .drain(rx)
            .await;
        assert_eq!(analysis.internal, 2);
        assert_eq!(analysis.inaccessible, 1);
    }
}
