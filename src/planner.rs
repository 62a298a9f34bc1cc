//! Planner: selection → influence estimates → top-N → notification.

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::estimator::Estimator;
use crate::notifier::Notifier;
use crate::paper::Paper;
use crate::selector::Selector;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::info;

pub struct Planner {
    selector: Selector,
    estimator: Estimator,
    notifier: Arc<dyn Notifier>,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(
        selector: Selector,
        estimator: Estimator,
        notifier: Arc<dyn Notifier>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            selector,
            estimator,
            notifier,
            config,
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Surface the most influential relevant papers for `request`.
    ///
    /// Returns `Ok(None)` when the selector found nothing to rank. Any
    /// estimation failure aborts the run before the notifier is called.
    pub async fn plan(&self, memory: &[String], request: &str) -> Result<Option<Vec<Paper>>> {
        let selection = match self.selector.scan(memory, request).await? {
            Some(selection) if !selection.is_empty() => selection,
            _ => {
                info!("No candidates to plan over");
                return Ok(None);
            }
        };

        let mut papers = self.estimate_all(selection.papers).await?;
        // sort_by is stable: ties keep the selector's relevance order
        papers.sort_by(|a, b| {
            let a = a.predicted_influence_score.unwrap_or_default();
            let b = b.predicted_influence_score.unwrap_or_default();
            b.total_cmp(&a)
        });
        papers.truncate(self.config.top_n);

        info!(surfaced = papers.len(), top_n = self.config.top_n, "Plan complete");
        self.notifier.alert(&papers).await;
        Ok(Some(papers))
    }

    async fn estimate_all(&self, papers: Vec<Paper>) -> Result<Vec<Paper>> {
        let concurrency = self.config.estimate_concurrency.max(1);

        stream::iter(papers)
            .map(|mut paper| async move {
                let score = self.estimator.evaluate(&paper.describe()).await?;
                paper.predicted_influence_score = Some(score);
                Ok::<_, crate::error::ScoutError>(paper)
            })
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use crate::error::ScoutError;
    use crate::estimator::{InfluenceModel, LinearCombiner};
    use crate::llm::{LanguageModel, ResponseSchema};
    use crate::paper::YearRange;
    use crate::retriever::{PaperSource, Retriever};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Query on plain calls, a fixed selection on structured calls
    struct ScriptedModel {
        selection: String,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok("test query".to_string())
        }

        async fn complete_structured(
            &self,
            _system: &str,
            _user: &str,
            _schema: &ResponseSchema,
        ) -> Result<String> {
            Ok(self.selection.clone())
        }
    }

    struct StaticSource(Vec<Paper>);

    #[async_trait]
    impl PaperSource for StaticSource {
        async fn fetch(&self, _q: &str, _o: u32, _l: u32, _y: &YearRange) -> Vec<Paper> {
            self.0.clone()
        }
    }

    /// Reads the estimate from the citation line of the description
    struct CitationEcho;

    #[async_trait]
    impl InfluenceModel for CitationEcho {
        fn name(&self) -> &str {
            "echo"
        }

        async fn estimate(&self, description: &str) -> Result<f64> {
            description
                .lines()
                .find_map(|l| l.strip_prefix("Citations: "))
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| ScoutError::Parse("no citations".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn alert(&self, papers: &[Paper]) {
            let titles = papers.iter().map(|p| p.title.clone()).collect();
            self.alerts.lock().unwrap().push(titles);
        }
    }

    fn paper(n: usize, citations: Option<i64>) -> Paper {
        Paper {
            title: format!("Paper {}", n),
            abstract_text: format!("abstract {}", n),
            url: format!("https://example.org/{}", n),
            observed_citation_count: citations,
            ..Default::default()
        }
    }

    fn selection_json(papers: &[Paper]) -> String {
        let items: Vec<_> = papers
            .iter()
            .map(|p| {
                serde_json::json!({
                    "title": p.title,
                    "abstract": p.abstract_text,
                    "url": p.url,
                    "score": 0.5,
                })
            })
            .collect();
        serde_json::json!({ "papers": items }).to_string()
    }

    fn planner(
        papers: Vec<Paper>,
        top_n: usize,
        concurrency: usize,
    ) -> (Planner, Arc<RecordingNotifier>) {
        let selection = selection_json(&papers);
        planner_with_selection(papers, selection, top_n, concurrency)
    }

    fn planner_with_selection(
        papers: Vec<Paper>,
        selection: String,
        top_n: usize,
        concurrency: usize,
    ) -> (Planner, Arc<RecordingNotifier>) {
        let llm: Arc<dyn LanguageModel> = Arc::new(ScriptedModel { selection });
        let retriever = Retriever::new(llm.clone(), Arc::new(StaticSource(papers)));
        let selector = Selector::new(
            retriever,
            llm,
            SelectorConfig::default(),
            50,
            YearRange::default(),
        );
        // identity on the specialist feature
        let estimator = Estimator::new(
            Arc::new(CitationEcho),
            Arc::new(CitationEcho),
            Arc::new(CitationEcho),
            LinearCombiner::new(0.0, [1.0, 0.0, 0.0, 0.0, 0.0]),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let config = PlannerConfig {
            top_n,
            estimate_concurrency: concurrency,
        };
        (
            Planner::new(selector, estimator, notifier.clone(), config),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_plan_orders_by_influence_and_keeps_top_n() {
        let papers = vec![
            paper(1, Some(3)),
            paper(2, Some(40)),
            paper(3, Some(7)),
            paper(4, Some(40)),
            paper(5, Some(1)),
        ];
        for concurrency in [1, 4] {
            let (planner, notifier) = planner(papers.clone(), 3, concurrency);
            let best = planner.plan(&[], "graph learning").await.unwrap().unwrap();

            let titles: Vec<&str> = best.iter().map(|p| p.title.as_str()).collect();
            assert_eq!(titles, vec!["Paper 2", "Paper 4", "Paper 3"]);
            assert_eq!(best[0].predicted_influence_score, Some(40.0));
            assert_eq!(best[0].observed_citation_count, Some(40));
            assert_eq!(notifier.alerts.lock().unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_estimation_failure_aborts_without_alert() {
        let papers = vec![paper(1, Some(3)), paper(2, None)];
        let (planner, notifier) = planner(papers, 5, 1);
        let err = planner.plan(&[], "graph learning").await.unwrap_err();
        assert!(matches!(err, ScoutError::CollaboratorUnavailable { .. }));
        assert!(notifier.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_to_rank() {
        let (planner, notifier) = planner(vec![paper(1, Some(3))], 5, 1);
        let memory = vec!["https://example.org/1".to_string()];
        assert!(planner.plan(&memory, "graph learning").await.unwrap().is_none());
        assert!(notifier.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_is_nothing_to_rank() {
        let papers = vec![paper(1, Some(3)), paper(2, Some(9))];
        for selection in [
            r#"{"papers": []}"#.to_string(),
            selection_json(&[paper(7, Some(1))]),
        ] {
            let (planner, notifier) = planner_with_selection(papers.clone(), selection, 5, 1);
            assert!(planner.plan(&[], "graph learning").await.unwrap().is_none());
            assert!(notifier.alerts.lock().unwrap().is_empty());
        }
    }
}
