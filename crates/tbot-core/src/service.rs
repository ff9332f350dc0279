use std::sync::Arc;

use crate::{
    dispatch::{DispatchReport, Dispatcher},
    domain::ChatId,
    pipeline::{RunSummary, TenderPipeline},
};

#[derive(Clone, Debug)]
pub struct DeliveryOutcome {
    pub found: usize,
    pub report: DispatchReport,
    pub summary: RunSummary,
}

/// One search-and-deliver implementation behind both the `/tenders` command
/// and the periodic broadcast.
#[derive(Clone)]
pub struct TenderService {
    pipeline: Arc<TenderPipeline>,
    dispatcher: Dispatcher,
}

impl TenderService {
    pub fn new(pipeline: Arc<TenderPipeline>, dispatcher: Dispatcher) -> Self {
        Self {
            pipeline,
            dispatcher,
        }
    }

    pub fn pipeline(&self) -> &Arc<TenderPipeline> {
        &self.pipeline
    }

    pub async fn deliver(&self, destination: ChatId) -> DeliveryOutcome {
        let outcome = self.pipeline.search().await;
        let messages: Vec<String> = outcome
            .tenders
            .iter()
            .map(|t| self.pipeline.formatter().format(t))
            .collect();

        let report = self.dispatcher.dispatch(destination, &messages).await;
        DeliveryOutcome {
            found: messages.len(),
            report,
            summary: outcome.summary,
        }
    }
}
