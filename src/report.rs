//! Improvement reporting.
//!
//! The search calls a [`TourReporter`] synchronously each time it accepts a
//! strictly better tour, and never otherwise. What happens with the event
//! (logging, drawing, recording) is up to the sink.

use serde::Serialize;

/// A strictly better tour accepted by the search
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Improvement<'a> {
    /// ILS iteration index (0-based) that produced the tour
    pub iteration: usize,
    /// Exact length of the tour
    pub cost: i64,
    /// The tour, in visiting order
    pub tour: &'a [usize],
}

/// Sink for accepted improvements
pub trait TourReporter {
    fn report(&mut self, event: &Improvement<'_>);
}

impl<F> TourReporter for F
where
    F: FnMut(&Improvement<'_>),
{
    fn report(&mut self, event: &Improvement<'_>) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl TourReporter for NullReporter {
    fn report(&mut self, _event: &Improvement<'_>) {}
}

/// Logs every event at `info` level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl TourReporter for LogReporter {
    fn report(&mut self, event: &Improvement<'_>) {
        log::info!(
            "New best found at iteration {}; total length = {}",
            event.iteration,
            event.cost
        );
        log::debug!("Tour: {:?}", event.tour);
    }
}

/// An owned copy of an [`Improvement`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedImprovement {
    pub iteration: usize,
    pub cost: i64,
    pub tour: Vec<usize>,
}

/// Records every event in order
#[derive(Debug, Default, Clone)]
pub struct ImprovementHistory {
    pub events: Vec<RecordedImprovement>,
}

impl ImprovementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&RecordedImprovement> {
        self.events.last()
    }
}

impl TourReporter for ImprovementHistory {
    fn report(&mut self, event: &Improvement<'_>) {
        self.events.push(RecordedImprovement {
            iteration: event.iteration,
            cost: event.cost,
            tour: event.tour.to_vec(),
        });
    }
}

/// Forwards every event to two sinks
pub struct Tee<A, B>(pub A, pub B);

impl<A: TourReporter, B: TourReporter> TourReporter for Tee<A, B> {
    fn report(&mut self, event: &Improvement<'_>) {
        self.0.report(event);
        self.1.report(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_owned_copies() {
        let mut history = ImprovementHistory::new();
        let tour = vec![2, 0, 1];
        history.report(&Improvement { iteration: 4, cost: 17, tour: &tour });
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.last(),
            Some(&RecordedImprovement { iteration: 4, cost: 17, tour: vec![2, 0, 1] })
        );
    }

    #[test]
    fn test_closure_and_tee() {
        let mut costs = Vec::new();
        let recorded = {
            let closure = |e: &Improvement<'_>| costs.push(e.cost);
            let mut tee = Tee(closure, ImprovementHistory::new());
            tee.report(&Improvement { iteration: 0, cost: 10, tour: &[0, 1] });
            tee.report(&Improvement { iteration: 3, cost: 8, tour: &[1, 0] });
            tee.1
        };
        assert_eq!(costs, vec![10, 8]);
        assert_eq!(recorded.len(), 2);
    }
}
