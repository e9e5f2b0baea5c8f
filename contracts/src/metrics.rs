//! # Prometheus Metrics
//!
//! Operational counters for the vault program. All metrics live in a
//! dedicated [`prometheus::Registry`] under the `cvault` prefix, so an
//! embedding host can merge them into its own exposition without
//! colliding with the default global registry.

use cvault_protocol::config::METRICS_NAMESPACE;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::ErrorClass;
use crate::settlement::SettlementOutcome;

/// Redemption path label values.
pub const PATH_CONDITIONAL: &str = "conditional_tokens";
pub const PATH_DEPOSIT_SLIP: &str = "deposit_slip";

/// Metric handles for one program instance.
///
/// Cheap to clone: prometheus handles are reference-counted.
#[derive(Clone)]
pub struct ProgramMetrics {
    registry: Registry,
    pub vaults_initialized_total: IntCounter,
    pub deposit_slips_initialized_total: IntCounter,
    pub mints_total: IntCounter,
    /// Underlying base units moved into escrow by minting.
    pub underlying_deposited_total: IntCounter,
    /// Settlements by outcome (`finalized` / `reverted`).
    pub settlements_total: IntCounterVec,
    /// Successful redemptions by path.
    pub redemptions_total: IntCounterVec,
    /// Underlying base units paid out of escrow by redemption.
    pub underlying_redeemed_total: IntCounter,
    /// Rejected instructions by error class.
    pub rejections_total: IntCounterVec,
    /// Wall-clock time spent per instruction, including the commit.
    pub instruction_duration_seconds: HistogramVec,
}

impl std::fmt::Debug for ProgramMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramMetrics").finish_non_exhaustive()
    }
}

impl ProgramMetrics {
    /// Create and register every metric.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(METRICS_NAMESPACE.into()), None)?;

        let vaults_initialized_total =
            IntCounter::new("vaults_initialized_total", "Vaults created")?;
        registry.register(Box::new(vaults_initialized_total.clone()))?;

        let deposit_slips_initialized_total =
            IntCounter::new("deposit_slips_initialized_total", "Deposit slips created")?;
        registry.register(Box::new(deposit_slips_initialized_total.clone()))?;

        let mints_total = IntCounter::new("mints_total", "Successful conditional token mints")?;
        registry.register(Box::new(mints_total.clone()))?;

        let underlying_deposited_total = IntCounter::new(
            "underlying_deposited_total",
            "Underlying base units deposited into vault escrow",
        )?;
        registry.register(Box::new(underlying_deposited_total.clone()))?;

        let settlements_total = IntCounterVec::new(
            Opts::new("settlements_total", "Vault settlements by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(settlements_total.clone()))?;

        let redemptions_total = IntCounterVec::new(
            Opts::new("redemptions_total", "Successful redemptions by path"),
            &["path"],
        )?;
        registry.register(Box::new(redemptions_total.clone()))?;

        let underlying_redeemed_total = IntCounter::new(
            "underlying_redeemed_total",
            "Underlying base units paid out of vault escrow",
        )?;
        registry.register(Box::new(underlying_redeemed_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("rejections_total", "Rejected instructions by error class"),
            &["class"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let instruction_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "instruction_duration_seconds",
                "Instruction execution time in seconds, commit included",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
            ]),
            &["instruction"],
        )?;
        registry.register(Box::new(instruction_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            vaults_initialized_total,
            deposit_slips_initialized_total,
            mints_total,
            underlying_deposited_total,
            settlements_total,
            redemptions_total,
            underlying_redeemed_total,
            rejections_total,
            instruction_duration_seconds,
        })
    }

    pub fn record_mint(&self, amount: u64) {
        self.mints_total.inc();
        self.underlying_deposited_total.inc_by(amount);
    }

    pub fn record_settlement(&self, outcome: SettlementOutcome) {
        self.settlements_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn record_redemption(&self, path: &str, amount: u64) {
        self.redemptions_total.with_label_values(&[path]).inc();
        self.underlying_redeemed_total.inc_by(amount);
    }

    pub fn record_rejection(&self, class: ErrorClass) {
        self.rejections_total
            .with_label_values(&[class.as_str()])
            .inc();
    }

    pub fn observe_duration(&self, instruction: &str, seconds: f64) {
        self.instruction_duration_seconds
            .with_label_values(&[instruction])
            .observe(seconds);
    }

    /// Encode all registered metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
