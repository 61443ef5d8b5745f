//! Quota-aware inference gateway.
//!
//! Every call to the hosted model goes through `InferenceGateway`, which spaces
//! out call starts, bounds each call with a timeout, classifies failures, backs
//! off for a cooldown window after a quota error, and always hands the caller a
//! usable value: a real result, or a locally computed fallback.

mod degraded;
pub mod fallback;
mod listeners;
pub mod parse;
mod prompts;
mod throttle;

pub use degraded::DegradedMode;
pub use listeners::{FailureCallback, FailureListeners, Subscription};
pub use throttle::Throttle;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use venue_common::{
    DensityCluster, FailureEvent, FailureKind, IncidentReport, TacticalResponse, VenueSection,
};

use crate::config::Config;
use crate::transport::{GenerationRequest, InferenceTransport, InlineImage, TransportError};

/// Tunables for the gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Minimum gap between the starts of two outbound calls.
    pub min_request_gap: Duration,
    /// Length of degraded mode after a quota error.
    pub quota_cooldown: Duration,
    /// Upper bound on a single outbound call.
    pub request_timeout: Duration,
    pub reasoning_model: String,
    pub fast_model: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            min_request_gap: Duration::from_millis(2500),
            quota_cooldown: Duration::from_secs(60),
            request_timeout: Duration::from_secs(12),
            reasoning_model: "gemini-3-pro-preview".to_string(),
            fast_model: "gemini-3-flash-preview".to_string(),
        }
    }
}

impl From<&Config> for GatewaySettings {
    fn from(config: &Config) -> Self {
        Self {
            min_request_gap: config.throttle.min_request_gap(),
            quota_cooldown: config.throttle.quota_cooldown(),
            request_timeout: config.inference.request_timeout(),
            reasoning_model: config.inference.reasoning_model.clone(),
            fast_model: config.inference.fast_model.clone(),
        }
    }
}

/// Result of a people count.
///
/// Failures are distinct variants, never a count of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeopleCount {
    /// A successful call; zero is a legitimate count.
    Counted(u32),
    /// Inference failed for a non-quota reason.
    Failed,
    /// Quota exhausted or degraded mode active.
    QuotaExhausted,
}

impl PeopleCount {
    pub const FAILED_SENTINEL: i64 = -1;
    pub const QUOTA_SENTINEL: i64 = -2;

    /// Single-integer encoding: the count, `-1` for failure, `-2` for quota.
    pub fn as_i64(&self) -> i64 {
        match self {
            PeopleCount::Counted(n) => i64::from(*n),
            PeopleCount::Failed => Self::FAILED_SENTINEL,
            PeopleCount::QuotaExhausted => Self::QUOTA_SENTINEL,
        }
    }

    pub fn count(&self) -> Option<u32> {
        match self {
            PeopleCount::Counted(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<PeopleCount> for i64 {
    fn from(count: PeopleCount) -> Self {
        count.as_i64()
    }
}

/// Point-in-time view of the gateway's backoff state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub degraded: bool,
    /// Seconds left in the degraded window, rounded up.
    pub degraded_remaining_secs: Option<u64>,
    pub min_request_gap_ms: u64,
}

/// Why a call produced no usable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallError {
    /// Short-circuited by degraded mode; no call was made.
    Degraded,
    /// The call was made and failed.
    Failed(FailureKind),
}

impl CallError {
    fn is_quota(&self) -> bool {
        matches!(self, CallError::Degraded | CallError::Failed(FailureKind::Quota))
    }
}

impl From<&TransportError> for FailureKind {
    fn from(error: &TransportError) -> Self {
        match error {
            TransportError::QuotaExhausted(_) => FailureKind::Quota,
            TransportError::MissingCredential | TransportError::CredentialRejected(_) => {
                FailureKind::Key
            }
            TransportError::Service { .. }
            | TransportError::Communication(_)
            | TransportError::InvalidResponse(_) => FailureKind::Generic,
        }
    }
}

/// Mediates every call to the hosted model.
///
/// Construct once and share via `Arc`. None of the request operations return
/// an error.
pub struct InferenceGateway {
    transport: Arc<dyn InferenceTransport>,
    settings: GatewaySettings,
    throttle: Throttle,
    degraded: DegradedMode,
    listeners: FailureListeners,
}

impl InferenceGateway {
    pub fn new(transport: Arc<dyn InferenceTransport>, settings: GatewaySettings) -> Self {
        Self {
            transport,
            throttle: Throttle::new(settings.min_request_gap),
            degraded: DegradedMode::new(settings.quota_cooldown),
            listeners: FailureListeners::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    // ------------------------------------------------------------------------
    // Request operations
    // ------------------------------------------------------------------------

    /// Tactical response for an incident.
    ///
    /// Standby response while degraded or on quota errors; the fixed fallback
    /// on any other failure or unusable output.
    pub async fn request_tactical_response(
        &self,
        incident: &IncidentReport,
        sections: &[VenueSection],
    ) -> TacticalResponse {
        let request = GenerationRequest::text(
            &self.settings.reasoning_model,
            prompts::tactical(incident, sections),
        )
        .with_schema(prompts::tactical_schema());

        match self.call(request).await {
            Ok(text) => match parse::parse_tactical_response(&text) {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Unusable tactical response: {}", e);
                    self.report(FailureKind::Generic, &e.to_string());
                    fallback::fallback_tactical_response()
                }
            },
            Err(e) if e.is_quota() => fallback::standby_tactical_response(),
            Err(_) => fallback::fallback_tactical_response(),
        }
    }

    /// Short safety directive for the current venue state.
    pub async fn request_insight_text(&self, sections: &[VenueSection]) -> String {
        let request =
            GenerationRequest::text(&self.settings.fast_model, prompts::insight(sections));

        match self.call(request).await {
            Ok(text) if text.trim().is_empty() => fallback::INSIGHT_EMPTY.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) if e.is_quota() => fallback::INSIGHT_STANDBY.to_string(),
            Err(_) => fallback::INSIGHT_UNAVAILABLE.to_string(),
        }
    }

    /// Count the people visible in a base64 JPEG frame.
    pub async fn count_people_in_image(&self, image_base64: &str) -> PeopleCount {
        let request = GenerationRequest::text(&self.settings.fast_model, prompts::COUNT_PEOPLE)
            .with_image(InlineImage::jpeg(image_base64));

        match self.call(request).await {
            Ok(text) => match parse::extract_count(&text) {
                Ok(count) => PeopleCount::Counted(count),
                Err(e) => {
                    tracing::warn!("Unusable people count: {}", e);
                    self.report(FailureKind::Generic, &e.to_string());
                    PeopleCount::Failed
                }
            },
            Err(e) if e.is_quota() => PeopleCount::QuotaExhausted,
            Err(_) => PeopleCount::Failed,
        }
    }

    /// Crowd hotspots on the venue schematic.
    ///
    /// Falls back to clusters synthesized from section loads.
    pub async fn request_density_map(&self, sections: &[VenueSection]) -> Vec<DensityCluster> {
        let request = GenerationRequest::text(
            &self.settings.reasoning_model,
            prompts::density_map(sections),
        )
        .with_schema(prompts::density_schema());

        match self.call(request).await {
            Ok(text) => match parse::parse_density_clusters(&text) {
                Ok(clusters) => clusters,
                Err(e) => {
                    tracing::warn!("Unusable density map: {}", e);
                    self.report(FailureKind::Generic, &e.to_string());
                    fallback::synthetic_density_map(sections)
                }
            },
            Err(_) => fallback::synthetic_density_map(sections),
        }
    }

    // ------------------------------------------------------------------------
    // Failure subscription and degraded mode
    // ------------------------------------------------------------------------

    /// Register `callback(kind, message)` for every classified failure.
    pub fn subscribe_to_failures<F>(&self, callback: F) -> Subscription
    where
        F: Fn(FailureKind, &str) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Stream of failure events for async consumers.
    pub fn failure_events(&self) -> broadcast::Receiver<FailureEvent> {
        self.listeners.events()
    }

    /// Leave degraded mode immediately (e.g. after new credentials).
    pub fn reset_degraded_mode(&self) {
        self.degraded.reset();
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_active()
    }

    pub fn status(&self) -> GatewayStatus {
        let remaining = self.degraded.remaining();
        GatewayStatus {
            degraded: remaining.is_some(),
            degraded_remaining_secs: remaining.map(|r| r.as_secs() + u64::from(r.subsec_nanos() > 0)),
            min_request_gap_ms: self.throttle.min_gap().as_millis() as u64,
        }
    }

    // ------------------------------------------------------------------------
    // Call pipeline
    // ------------------------------------------------------------------------

    /// Degraded check, throttle, bounded call, classification.
    async fn call(&self, request: GenerationRequest) -> Result<String, CallError> {
        if self.degraded.is_active() {
            tracing::debug!("Degraded mode active, skipping call to {}", request.model);
            return Err(CallError::Degraded);
        }

        self.throttle.acquire().await;

        // Another caller may have hit the quota while this one waited.
        if self.degraded.is_active() {
            tracing::debug!("Degraded mode entered while throttled, skipping call");
            return Err(CallError::Degraded);
        }

        tracing::debug!(
            "Calling {} model={} image={}",
            self.transport.name(),
            request.model,
            request.image.is_some()
        );

        let outcome =
            tokio::time::timeout(self.settings.request_timeout, self.transport.generate(&request))
                .await;

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                let kind = FailureKind::from(&e);
                tracing::warn!("Inference call failed ({}): {}", kind, e);
                if kind == FailureKind::Quota {
                    self.degraded.enter();
                }
                self.report(kind, &e.to_string());
                Err(CallError::Failed(kind))
            }
            Err(_) => {
                let detail = format!(
                    "request timed out after {}s",
                    self.settings.request_timeout.as_secs()
                );
                tracing::warn!("Inference call to {} {}", request.model, detail);
                self.report(FailureKind::Generic, &detail);
                Err(CallError::Failed(FailureKind::Generic))
            }
        }
    }

    fn report(&self, kind: FailureKind, detail: &str) {
        let message =
            fallback::failure_message(kind, self.settings.quota_cooldown.as_secs(), detail);
        self.listeners.notify(kind, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn gateway(transport: &Arc<ScriptedTransport>) -> InferenceGateway {
        InferenceGateway::new(transport.clone(), GatewaySettings::default())
    }

    fn quota() -> TransportError {
        TransportError::QuotaExhausted("Resource has been exhausted".to_string())
    }

    #[test]
    fn test_people_count_sentinels() {
        assert_eq!(PeopleCount::Counted(0).as_i64(), 0);
        assert_eq!(PeopleCount::Counted(12).as_i64(), 12);
        assert_eq!(PeopleCount::Failed.as_i64(), -1);
        assert_eq!(i64::from(PeopleCount::QuotaExhausted), -2);
        assert_eq!(PeopleCount::Failed.count(), None);
    }

    #[test]
    fn test_failure_kind_from_transport_error() {
        assert_eq!(FailureKind::from(&quota()), FailureKind::Quota);
        assert_eq!(
            FailureKind::from(&TransportError::MissingCredential),
            FailureKind::Key
        );
        assert_eq!(
            FailureKind::from(&TransportError::Service {
                status: 500,
                message: "x".to_string()
            }),
            FailureKind::Generic
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_sentinels_are_distinct() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok("0");
        transport.push_err(TransportError::Communication("reset by peer".to_string()));
        transport.push_err(quota());
        let gateway = gateway(&transport);

        assert_eq!(gateway.count_people_in_image("img").await, PeopleCount::Counted(0));
        assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -1);
        assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -2);
        assert!(gateway.is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_extraction_through_gateway() {
        let transport = Arc::new(ScriptedTransport::new());
        for reply in ["3", " 12 people detected", "No people, 0", "", "abc"] {
            transport.push_ok(reply);
        }
        let gateway = gateway(&transport);

        let mut counts = Vec::new();
        for _ in 0..5 {
            counts.push(gateway.count_people_in_image("img").await.as_i64());
        }
        assert_eq!(counts, vec![3, 12, 0, 0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_request_carries_image() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok("4");
        let gateway = gateway(&transport);
        gateway.count_people_in_image("BASE64DATA").await;

        let requests = transport.requests();
        let image = requests[0].image.as_ref().unwrap();
        assert_eq!(image.data, "BASE64DATA");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(requests[0].model, "gemini-3-flash-preview");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tactical_response_parses_fenced_json() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(
            "```json\n{\"priority\": \"Critical\", \"actions\": [\"Close gate A1\"], \
             \"suggestedRoute\": \"East exit\", \"riskAssessment\": \"Crowd surge\"}\n```",
        );
        let gateway = gateway(&transport);

        let response = gateway
            .request_tactical_response(&IncidentReport::default(), &[])
            .await;
        assert_eq!(response.priority, "Critical");
        assert_eq!(response.suggested_route.as_deref(), Some("East exit"));
        assert!(transport.requests()[0].response_schema.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tactical_response_malformed_json_falls_back() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(r#"{"priority": "High", "actions": ["#);
        let gateway = gateway(&transport);
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let seen = kinds.clone();
        gateway.subscribe_to_failures(move |kind, _| seen.lock().unwrap().push(kind));

        let response = gateway
            .request_tactical_response(&IncidentReport::default(), &[])
            .await;
        assert_eq!(response, fallback::fallback_tactical_response());
        assert!(!response.priority.is_empty());
        assert!(!response.actions.is_empty());
        assert!(!response.risk_assessment.is_empty());
        assert_eq!(*kinds.lock().unwrap(), vec![FailureKind::Generic]);
        assert!(!gateway.is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tactical_response_quota_returns_standby() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_err(quota());
        let gateway = gateway(&transport);

        let response = gateway
            .request_tactical_response(&IncidentReport::default(), &[])
            .await;
        assert_eq!(response, fallback::standby_tactical_response());
        assert!(gateway.is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_failure_notifies_without_degrading() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_err(TransportError::MissingCredential);
        let gateway = gateway(&transport);
        let messages = Arc::new(Mutex::new(Vec::new()));
        let seen = messages.clone();
        gateway.subscribe_to_failures(move |kind, message| {
            seen.lock().unwrap().push((kind, message.to_string()))
        });

        let insight = gateway.request_insight_text(&[]).await;
        assert_eq!(insight, fallback::INSIGHT_UNAVAILABLE);
        assert!(!gateway.is_degraded());
        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, FailureKind::Key);
        assert!(messages[0].1.contains("API key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insight_text_trimmed_and_empty_fallback() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok("  Open overflow lanes at West Gate now.\n");
        transport.push_ok("   ");
        let gateway = gateway(&transport);

        assert_eq!(
            gateway.request_insight_text(&[]).await,
            "Open overflow lanes at West Gate now."
        );
        assert_eq!(gateway.request_insight_text(&[]).await, fallback::INSIGHT_EMPTY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_density_map_falls_back_to_synthetic() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok("[{\"x\": 50, \"y\": 50, \"intensity\": 0.95}]");
        transport.push_ok("clusters unavailable");
        let gateway = gateway(&transport);
        let sections = vec![VenueSection::new(
            "A1",
            "West Gate",
            90,
            100,
            10,
            venue_common::GateType::Entrance,
        )];

        let real = gateway.request_density_map(&sections).await;
        assert_eq!(real.len(), 1);
        assert!(real[0].is_hotspot());

        let synthetic = gateway.request_density_map(&sections).await;
        assert_eq!(synthetic, fallback::synthetic_density_map(&sections));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_generic_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_delay(Duration::from_secs(30));
        transport.push_ok("5");
        let gateway = gateway(&transport);
        let generic = Arc::new(AtomicUsize::new(0));
        let seen = generic.clone();
        gateway.subscribe_to_failures(move |kind, message| {
            if kind == FailureKind::Generic && message.contains("timed out") {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(gateway.count_people_in_image("img").await, PeopleCount::Failed);
        assert_eq!(generic.load(Ordering::SeqCst), 1);
        assert!(!gateway.is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_remaining_window() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_err(quota());
        let gateway = gateway(&transport);
        assert!(!gateway.status().degraded);

        gateway.count_people_in_image("img").await;
        let status = gateway.status();
        assert!(status.degraded);
        assert_eq!(status.degraded_remaining_secs, Some(60));
        assert_eq!(status.min_request_gap_ms, 2500);
    }
}
