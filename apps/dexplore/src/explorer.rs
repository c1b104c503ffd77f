//! # Explorer
//!
//! Client-side owner of one exploration. Validates input locally, allows a
//! single request in flight, and adopts the service's snapshot only after the
//! full response has arrived and its graph extends the one already held.
//!
//! A failed call, or a call whose future is dropped before completion,
//! leaves the held state exactly as it was. The service may still have
//! committed that transition, so the held state is re-read from the service
//! after a recoverable failure and before the next submission that follows
//! a dropped call.

use crate::service::{ConvertedGraphs, ExplorationService};
use dexplore_core::{
    DexploreError, Event, ExplorationState, GraphKind, Rendering, Step, render, validate,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Clears the in-flight flag when the request finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Explorer<S> {
    service: S,
    state: Mutex<Option<ExplorationState>>,
    in_flight: AtomicBool,
    /// Event whose service call has not returned yet.
    unsettled: Mutex<Option<Event>>,
}

impl<S: ExplorationService> Explorer<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            unsettled: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Copy of the current snapshot, if an exploration was started.
    pub fn state(&self) -> Option<ExplorationState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a request is awaiting its response.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<InFlight<'_>, DexploreError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Submission rejected: a transition is already in flight");
            return Err(DexploreError::TransitionInFlight);
        }
        Ok(InFlight(&self.in_flight))
    }

    fn store(&self, next: ExplorationState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(next);
    }

    fn set_unsettled(&self, event: Option<Event>) -> Option<Event> {
        std::mem::replace(
            &mut *self.unsettled.lock().unwrap_or_else(PoisonError::into_inner),
            event,
        )
    }

    /// Adopt the service's snapshot if it already applied `event`.
    async fn recover(
        &self,
        current: &ExplorationState,
        event: &Event,
    ) -> Option<ExplorationState> {
        let fetched = self
            .service
            .current()
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "Could not re-read service state"))
            .ok()?;
        if fetched.graph.node_count() == current.graph.node_count() {
            return None;
        }

        match merge(current, event, fetched) {
            Ok(next) => {
                tracing::info!(
                    action = event.name(),
                    from = %current.step,
                    to = %next.step,
                    nodes = next.graph.node_count(),
                    "Adopted transition committed by the service"
                );
                self.store(next.clone());
                Some(next)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Service state cannot be adopted");
                None
            }
        }
    }

    /// Start (or restart) the exploration of `system`.
    pub async fn start(&self, system: &str) -> Result<ExplorationState, DexploreError> {
        let _flight = self.begin()?;
        let system = system.trim();
        if system.is_empty() {
            let err = DexploreError::Validation("system must not be empty".to_string());
            tracing::warn!(error = %err, "Start rejected");
            return Err(err);
        }

        let snapshot = self.service.start(system).await.inspect_err(log_failure)?;
        if snapshot.graph.kind() != GraphKind::De {
            return Err(DexploreError::Service(format!(
                "start returned a {} graph",
                snapshot.graph.kind()
            )));
        }

        tracing::info!(
            system = %snapshot.system,
            step = %snapshot.step,
            "Exploration started"
        );
        self.set_unsettled(None);
        self.store(snapshot.clone());
        Ok(snapshot)
    }

    /// Validate, dispatch and merge one event.
    pub async fn submit(&self, event: Event) -> Result<ExplorationState, DexploreError> {
        let _flight = self.begin()?;
        let mut current = self.state().ok_or(DexploreError::NotStarted)?;
        if let Some(dropped) = self.set_unsettled(None) {
            if let Some(adopted) = self.recover(&current, &dropped).await {
                current = adopted;
            }
        }

        if let Err(err) = validate(&current, &event) {
            tracing::warn!(action = event.name(), error = %err, "Input rejected");
            return Err(err);
        }

        self.set_unsettled(Some(event.clone()));
        let outcome = self.service.submit(&event).await;
        self.set_unsettled(None);

        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log_failure(&err);
                if err.is_recoverable() {
                    if let Some(adopted) = self.recover(&current, &event).await {
                        return Ok(adopted);
                    }
                }
                return Err(err);
            }
        };
        let next = merge(&current, &event, snapshot).inspect_err(log_failure)?;

        tracing::info!(
            action = event.name(),
            from = %current.step,
            to = %next.step,
            nodes = next.graph.node_count(),
            pending = next.pending_subsystems.len(),
            "Transition applied"
        );
        self.store(next.clone());
        Ok(next)
    }

    /// Render the current DE graph.
    pub fn render(&self) -> Result<Rendering, DexploreError> {
        self.state()
            .map(|state| render(&state.graph))
            .ok_or(DexploreError::NotStarted)
    }

    /// Convert the completed DE graph into `{de, ld, si}`.
    pub async fn convert(&self) -> Result<ConvertedGraphs, DexploreError> {
        let _flight = self.begin()?;
        let current = self.state().ok_or(DexploreError::NotStarted)?;
        if !current.is_completed() {
            return Err(DexploreError::Validation(
                "only a completed exploration can be converted".to_string(),
            ));
        }

        let converted = self
            .service
            .convert(&current.graph)
            .await
            .inspect_err(log_failure)?;
        converted.check()?;
        tracing::info!(
            de = converted.de.node_count(),
            ld = converted.ld.node_count(),
            si = converted.si.node_count(),
            "Conversion received"
        );
        Ok(converted)
    }
}

/// Adopt `snapshot`, keeping the held graph as the authoritative prefix.
fn merge(
    current: &ExplorationState,
    event: &Event,
    snapshot: ExplorationState,
) -> Result<ExplorationState, DexploreError> {
    if !is_successor(current, event, &snapshot) {
        return Err(DexploreError::Service(format!(
            "'{}' cannot move {} to {} ({})",
            event.name(),
            current.step,
            snapshot.step,
            snapshot.system
        )));
    }
    let mut graph = current.graph.clone();
    graph.extend_from(&snapshot.graph)?;
    Ok(ExplorationState { graph, ..snapshot })
}

/// Whether `event` can take `current` to `snapshot`.
fn is_successor(current: &ExplorationState, event: &Event, snapshot: &ExplorationState) -> bool {
    let pending = &current.pending_subsystems;
    match event {
        Event::Situation { .. } => snapshot.step == Step::ProblemIdentification,
        Event::Problem { .. } => snapshot.step == Step::EstablishIntention,
        Event::Intention { .. } => snapshot.step == Step::ChoosePath,
        Event::Decompose { sub_systems, .. } => match pending.front() {
            Some(next) => popped(current, next, snapshot),
            None => match snapshot.step {
                Step::Completed => true,
                Step::SituationAssessment => {
                    sub_systems.iter().any(|s| s.trim() == snapshot.system)
                }
                _ => false,
            },
        },
        Event::Solution { .. } => match pending.front() {
            Some(next) => {
                popped(current, next, snapshot)
                    && snapshot.pending_subsystems.len() + 1 == pending.len()
            }
            None => snapshot.step == Step::Completed,
        },
    }
}

/// `snapshot` entered `next` and kept the rest of the worklist in order.
fn popped(current: &ExplorationState, next: &str, snapshot: &ExplorationState) -> bool {
    let rest = current.pending_subsystems.iter().skip(1);
    snapshot.step == Step::SituationAssessment
        && snapshot.system == next
        && snapshot.pending_subsystems.len() + 1 >= current.pending_subsystems.len()
        && snapshot.pending_subsystems.iter().zip(rest).all(|(a, b)| a == b)
}

fn log_failure(err: &DexploreError) {
    if err.is_recoverable() {
        tracing::error!(error = %err, "Exploration service failed; state kept");
    } else {
        tracing::warn!(error = %err, "Exploration service rejected input");
    }
}
