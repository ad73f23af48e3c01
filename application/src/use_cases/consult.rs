//! Consult use case
//!
//! Dispatch to every seat, then synthesize the successful answers.

use crate::ports::backend::QueryOptions;
use crate::ports::consultation_logger::{
    ConsultationEvent, ConsultationLogger, NoConsultationLogger,
};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::deliberate::Dispatcher;
use council_domain::{DeliberationResult, Question, SynthesisData, SynthesisEngine};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the Consult use case
#[derive(Debug, Clone)]
pub struct ConsultInput {
    pub question: Question,
    /// Attachments and cancellation for every seat
    pub options: QueryOptions,
}

impl ConsultInput {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

/// Dispatcher output plus the synthesis computed from it.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultOutput {
    pub deliberation: DeliberationResult,
    pub synthesis: SynthesisData,
}

/// Use case for a full consultation
pub struct ConsultUseCase {
    dispatcher: Dispatcher,
    engine: SynthesisEngine,
    logger: Arc<dyn ConsultationLogger>,
}

impl ConsultUseCase {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            engine: SynthesisEngine::default(),
            logger: Arc::new(NoConsultationLogger),
        }
    }

    pub fn with_engine(mut self, engine: SynthesisEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConsultationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn execute(&self, input: ConsultInput) -> ConsultOutput {
        self.execute_with_progress(input, &NoProgress).await
    }

    pub async fn execute_with_progress(
        &self,
        input: ConsultInput,
        progress: &dyn ProgressNotifier,
    ) -> ConsultOutput {
        let prompt = input.question.content();

        self.logger.log(ConsultationEvent::new(
            "prompt",
            json!({
                "prompt": prompt,
                "seats": self.dispatcher.seats().iter().map(|s| s.name()).collect::<Vec<_>>(),
                "attachments": input.options.attachments.iter().map(|a| a.name()).collect::<Vec<_>>(),
            }),
        ));

        let deliberation = self
            .dispatcher
            .deliberate_with_progress(prompt, &input.options, progress)
            .await;

        for response in &deliberation.responses {
            self.logger.log(ConsultationEvent::new(
                "seat_response",
                event_payload("seat_response", response),
            ));
        }

        let synthesis = self.engine.synthesize(&deliberation.responses);
        info!(
            agreement_points = synthesis.agreement_points.len(),
            disagreements = synthesis.disagreements.len(),
            key_insights = synthesis.key_insights.len(),
            confidence = synthesis.confidence,
            "Synthesis complete"
        );

        self.logger.log(ConsultationEvent::new(
            "synthesis",
            json!({
                "success_count": deliberation.success_count,
                "failure_count": deliberation.failure_count,
                "total_latency_ms": deliberation.total_latency.as_millis() as u64,
                "synthesis": event_payload("synthesis", &synthesis),
            }),
        ));

        ConsultOutput {
            deliberation,
            synthesis,
        }
    }
}

/// Serialize an event payload, logging `null` in its place on failure.
fn event_payload<T: Serialize>(event_type: &str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(event = event_type, "Could not serialize consultation event: {}", e);
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::backend::{BackendError, BackendReply, ModelBackend};
    use crate::use_cases::deliberate::Seat;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Canned(&'static str, Result<&'static str, BackendError>);

    #[async_trait]
    impl ModelBackend for Canned {
        fn name(&self) -> &str {
            self.0
        }

        async fn query(
            &self,
            _prompt: &str,
            _options: &QueryOptions,
        ) -> Result<BackendReply, BackendError> {
            self.1
                .clone()
                .map(|text| BackendReply::new(text, self.0, Duration::from_millis(3)))
        }
    }

    #[derive(Default)]
    struct MemoryLogger(Mutex<Vec<(&'static str, serde_json::Value)>>);

    impl ConsultationLogger for MemoryLogger {
        fn log(&self, event: ConsultationEvent) {
            self.0.lock().unwrap().push((event.event_type, event.payload));
        }
    }

    fn use_case(seats: Vec<(&'static str, Result<&'static str, BackendError>)>) -> ConsultUseCase {
        let seats = seats
            .into_iter()
            .map(|(name, outcome)| Seat::new(name, Arc::new(Canned(name, outcome))))
            .collect();
        ConsultUseCase::new(Dispatcher::new(seats).unwrap())
    }

    fn question(text: &str) -> ConsultInput {
        ConsultInput::new(Question::try_new(text).unwrap())
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn test_event_payload_falls_back_to_null() {
        assert_eq!(event_payload("seat_response", &Unserializable), Value::Null);
        assert_eq!(
            event_payload("synthesis", &SynthesisData::empty())["confidence"],
            0.0
        );
    }

    #[tokio::test]
    async fn test_unanimous_council() {
        let consult = use_case(vec![
            ("claude", Ok("Use strict null checks.")),
            ("gpt", Ok("Use strict null checks.")),
            ("gemini", Ok("Use strict null checks.")),
        ]);

        let output = consult.execute(question("TypeScript config?")).await;

        assert_eq!(output.deliberation.success_count, 3);
        assert_eq!(
            output.synthesis.agreement_points,
            vec!["Use strict null checks.".to_string()]
        );
        assert!(output.synthesis.confidence >= 0.8);
    }

    #[tokio::test]
    async fn test_split_council() {
        let consult = use_case(vec![
            ("claude", Ok("Use MongoDB for flexibility.")),
            ("gpt", Ok("Do not use MongoDB here, use Postgres.")),
        ]);

        let output = consult.execute(question("Which database?")).await;

        assert_eq!(output.synthesis.disagreements.len(), 1);
        let disagreement = &output.synthesis.disagreements[0];
        assert!(disagreement.topic.contains("mongodb"));
        assert_eq!(disagreement.positions.len(), 2);
        assert!(output.synthesis.confidence < 0.6);
    }

    #[tokio::test]
    async fn test_partial_failure_synthesizes_survivors() {
        let consult = use_case(vec![
            ("claude", Ok("Cache hot keys in Redis.")),
            (
                "gpt",
                Err(BackendError::Connection("dns lookup failed".to_string())),
            ),
        ]);

        let output = consult.execute(question("Caching?")).await;

        assert_eq!(output.deliberation.success_count, 1);
        assert_eq!(output.deliberation.failure_count, 1);
        assert!(output.synthesis.agreement_points.is_empty());
        assert_eq!(output.synthesis.confidence, 0.5);
        assert_eq!(output.synthesis.key_insights[0].source, "claude");
    }

    #[tokio::test]
    async fn test_events_are_logged() {
        let logger = Arc::new(MemoryLogger::default());
        let consult = use_case(vec![
            ("claude", Ok("Yes.")),
            ("gpt", Err(BackendError::Other("boom".to_string()))),
        ])
        .with_logger(logger.clone());

        consult.execute(question("Ship it?")).await;

        let events = logger.0.lock().unwrap();
        let types: Vec<&str> = events.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            types,
            vec!["prompt", "seat_response", "seat_response", "synthesis"]
        );
        assert_eq!(events[0].1["prompt"], "Ship it?");
        assert_eq!(events[2].1["error"], "Other error: boom");
        assert_eq!(events[3].1["failure_count"], 1);
    }

    #[tokio::test]
    async fn test_output_serializes_for_json_format() {
        let consult = use_case(vec![("claude", Ok("Yes."))]);
        let output = consult.execute(question("Ship it?")).await;

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["deliberation"]["success_count"], 1);
        assert_eq!(value["synthesis"]["confidence"], 0.5);
    }
}
