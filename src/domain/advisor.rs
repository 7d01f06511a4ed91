//! Data contract with the external signal advisor.
//!
//! The core assembles an [`AdvisorRequest`] from the latest indicator snapshot
//! and the detected patterns, hands it to a [`SignalAdvisor`], and checks that
//! the returned [`AdvisorSignal`] is internally consistent. Timeouts and
//! transport failures belong to the advisor implementation.

use crate::domain::error::QuantError;
use crate::domain::pattern::PatternEvent;
use crate::domain::price_series::PriceSeries;
use crate::domain::snapshot::{IndicatorSnapshot, compute_indicators};
use crate::ports::advisor_port::SignalAdvisor;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsEvent {
    pub title: String,
    pub time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorRequest {
    pub indicator_snapshot: IndicatorSnapshot,
    pub pattern_events: Vec<PatternEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_news_event: Option<NewsEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorSignal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
    pub confidence: f64,
    pub reasoning: String,
    /// Fields the advisor adds beyond the fixed contract, passed through as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AdvisorSignal {
    pub fn validate(&self) -> Result<(), QuantError> {
        if !(self.confidence.is_finite() && (0.0..=100.0).contains(&self.confidence)) {
            return Err(invalid(format!(
                "confidence {} is outside [0, 100]",
                self.confidence
            )));
        }
        match self.signal_type {
            SignalType::Hold => Ok(()),
            SignalType::Buy if self.sl < self.entry && self.entry < self.tp => Ok(()),
            SignalType::Sell if self.tp < self.entry && self.entry < self.sl => Ok(()),
            SignalType::Buy => Err(invalid(format!(
                "BUY needs sl < entry < tp, got sl={} entry={} tp={}",
                self.sl, self.entry, self.tp
            ))),
            SignalType::Sell => Err(invalid(format!(
                "SELL needs tp < entry < sl, got tp={} entry={} sl={}",
                self.tp, self.entry, self.sl
            ))),
        }
    }
}

fn invalid(reason: String) -> QuantError {
    QuantError::InvalidAdvice { reason }
}

/// Builds the advisor payload from the latest bar of `series`.
pub fn build_advisor_request(
    series: &PriceSeries,
    patterns: &[PatternEvent],
    next_news_event: Option<NewsEvent>,
) -> Result<AdvisorRequest, QuantError> {
    let indicator_snapshot = compute_indicators(series).ok_or_else(|| QuantError::Advisor {
        reason: "cannot build a request from an empty price series".to_string(),
    })?;
    Ok(AdvisorRequest {
        indicator_snapshot,
        pattern_events: patterns.to_vec(),
        next_news_event,
    })
}

/// Asks `advisor` for a signal and rejects inconsistent answers.
pub fn request_advice(
    advisor: &dyn SignalAdvisor,
    request: &AdvisorRequest,
) -> Result<AdvisorSignal, QuantError> {
    let signal = advisor.advise(request)?;
    signal.validate()?;
    tracing::debug!(
        signal = ?signal.signal_type,
        confidence = signal.confidence,
        "advisor signal accepted"
    );
    Ok(signal)
}
