use super::ticker::{SharedWatchlist, TickerHandle};
use super::watchlist::default_watchlist;
use crate::advisor::{analyze_fund_or_hold, AdvisorBackend, FundAnalysisRequest};
use crate::error::Error;
use crate::models::{FundAnalysis, FundQuote};
use crate::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

/// Latest analysis per fund, tagged with the request that owns the slot
#[derive(Debug, Default)]
struct ResultSlot {
    generation: u64,
    analysis: Option<FundAnalysis>,
}

type SharedResults = Arc<RwLock<HashMap<String, ResultSlot>>>;

/// Live fund monitor: a ticking watchlist plus per-fund AI signals
///
/// At most one ticker runs per session. Dropping the session aborts it.
pub struct MonitorSession {
    backend: Arc<dyn AdvisorBackend>,
    watchlist: SharedWatchlist,
    results: SharedResults,
    tick_interval: Duration,
    ticker: Option<TickerHandle>,
}

impl MonitorSession {
    /// Create an inactive session over the default watchlist
    pub fn new(backend: Arc<dyn AdvisorBackend>, tick_interval: Duration) -> Self {
        Self::with_watchlist(backend, default_watchlist(), tick_interval)
    }

    pub fn with_watchlist(
        backend: Arc<dyn AdvisorBackend>,
        quotes: Vec<FundQuote>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            backend,
            watchlist: Arc::new(RwLock::new(quotes)),
            results: Arc::new(RwLock::new(HashMap::new())),
            tick_interval,
            ticker: None,
        }
    }

    /// Start the ticker. No-op if it is already running.
    pub fn activate(&mut self) {
        self.activate_with_rng(StdRng::from_entropy());
    }

    /// Start the ticker with a caller-supplied generator
    pub fn activate_with_rng(&mut self, rng: StdRng) {
        if self.ticker.is_some() {
            tracing::debug!("Monitor session already active");
            return;
        }

        self.ticker = Some(TickerHandle::spawn(
            self.watchlist.clone(),
            self.tick_interval,
            rng,
        ));
    }

    /// Stop the ticker and wait for it to exit. Returns the ticks applied.
    pub async fn deactivate(&mut self) -> u64 {
        match self.ticker.take() {
            Some(ticker) => ticker.stop().await,
            None => 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.ticker
            .as_ref()
            .map(TickerHandle::is_running)
            .unwrap_or(false)
    }

    /// Current quotes
    pub async fn snapshot(&self) -> Vec<FundQuote> {
        self.watchlist.read().await.clone()
    }

    /// Last analysis for a fund, if one has completed
    pub async fn result(&self, fund_id: &str) -> Option<FundAnalysis> {
        self.results
            .read()
            .await
            .get(fund_id)
            .and_then(|slot| slot.analysis.clone())
    }

    /// Analyse one fund from its current quote.
    ///
    /// Any previous result for the fund is cleared first. If analyses of the
    /// same fund overlap, only the most recently started one is stored.
    /// Service failures yield the HOLD fallback; only an unknown fund id is
    /// an error.
    pub async fn analyze(&self, fund_id: &str) -> Result<FundAnalysis> {
        let request = self.request_for(fund_id).await?;
        Ok(analyze_into(self.backend.clone(), self.results.clone(), request).await)
    }

    /// Analyse every fund concurrently.
    /// Results are returned in completion order.
    pub async fn analyze_all(&self) -> Vec<FundAnalysis> {
        let requests: Vec<FundAnalysisRequest> = self
            .watchlist
            .read()
            .await
            .iter()
            .map(FundAnalysisRequest::from)
            .collect();

        let mut tasks = JoinSet::new();
        for request in requests {
            tasks.spawn(analyze_into(
                self.backend.clone(),
                self.results.clone(),
                request,
            ));
        }

        let mut analyses = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => tracing::warn!(error = %e, "Fund analysis task failed"),
            }
        }

        analyses
    }

    async fn request_for(&self, fund_id: &str) -> Result<FundAnalysisRequest> {
        let quotes = self.watchlist.read().await;
        quotes
            .iter()
            .find(|quote| quote.id == fund_id)
            .map(FundAnalysisRequest::from)
            .ok_or_else(|| Error::validation(format!("unknown fund id: {}", fund_id)))
    }
}

async fn analyze_into(
    backend: Arc<dyn AdvisorBackend>,
    results: SharedResults,
    request: FundAnalysisRequest,
) -> FundAnalysis {
    let generation = {
        let mut results = results.write().await;
        let slot = results.entry(request.id.clone()).or_default();
        slot.generation += 1;
        slot.analysis = None;
        slot.generation
    };

    tracing::info!(fund_id = %request.id, fund = %request.name, "Analysing fund");
    let analysis = analyze_fund_or_hold(backend.as_ref(), &request).await;

    let mut results = results.write().await;
    match results.get_mut(&request.id) {
        Some(slot) if slot.generation == generation => {
            slot.analysis = Some(analysis.clone());
        }
        _ => {
            tracing::debug!(fund_id = %request.id, "Discarding superseded analysis");
        }
    }

    analysis
}
