use std::collections::{HashMap, VecDeque};

use cs_core::ScriptValue;
use tracing::debug;

use crate::completion::{Completer, Completion};

pub type PollPredicate<A> = Box<dyn FnMut(&A, f64) -> bool>;

struct PollWaiter<A> {
    predicate: PollPredicate<A>,
    completer: Completer,
}

/// Turns frame-polled conditions and named external events into
/// completions that command handlers suspend on.
///
/// Predicates receive the side-effect API and the executor clock in
/// milliseconds. They are evaluated once per [`BlockingResolver::tick`] and
/// must not have side effects the resolver would need to know about.
pub struct BlockingResolver<A> {
    polls: Vec<PollWaiter<A>>,
    events: HashMap<String, VecDeque<Completer>>,
}

impl<A> Default for BlockingResolver<A> {
    fn default() -> Self {
        Self {
            polls: Vec::new(),
            events: HashMap::new(),
        }
    }
}

impl<A> BlockingResolver<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Already-true predicates resolve immediately and are never registered.
    pub fn wait_until<F>(&mut self, api: &A, now_ms: f64, mut predicate: F) -> Completion
    where
        F: FnMut(&A, f64) -> bool + 'static,
    {
        if predicate(api, now_ms) {
            return Completion::ready(ScriptValue::Null);
        }

        let (completion, completer) = Completion::pending();
        self.polls.push(PollWaiter {
            predicate: Box::new(predicate),
            completer,
        });
        completion
    }

    pub fn wait_for_named(&mut self, name: &str) -> Completion {
        let (completion, completer) = Completion::pending();
        self.events
            .entry(name.to_string())
            .or_default()
            .push_back(completer);
        completion
    }

    /// Evaluates every outstanding predicate once and settles the ones that
    /// hold. Waiters whose run was dropped are discarded unevaluated.
    /// Returns how many waiters were resolved.
    pub fn tick(&mut self, api: &A, now_ms: f64) -> usize {
        let waiters = std::mem::take(&mut self.polls);
        let mut resolved = 0usize;
        for mut waiter in waiters {
            if waiter.completer.is_abandoned() {
                continue;
            }
            if (waiter.predicate)(api, now_ms) {
                waiter.completer.settle(ScriptValue::Null);
                resolved += 1;
            } else {
                self.polls.push(waiter);
            }
        }
        resolved
    }

    /// Settles the oldest live waiter registered under `name`, discarding
    /// abandoned ones ahead of it. Resolving a name nobody waits for is a
    /// no-op and returns false.
    pub fn resolve_named(&mut self, name: &str, value: ScriptValue) -> bool {
        let Some(queue) = self.events.get_mut(name) else {
            debug!("Event \"{}\" resolved with no waiter.", name);
            return false;
        };

        let mut settled = false;
        while let Some(completer) = queue.pop_front() {
            if completer.is_abandoned() {
                debug!("Discarding abandoned waiter for event \"{}\".", name);
                continue;
            }
            settled = completer.settle(value);
            break;
        }
        if queue.is_empty() {
            self.events.remove(name);
        }
        if !settled {
            debug!("Event \"{}\" resolved with no waiter.", name);
        }
        settled
    }

    pub fn has_pending(&self) -> bool {
        self.polls.iter().any(|waiter| !waiter.completer.is_abandoned())
            || self
                .events
                .values()
                .any(|queue| queue.iter().any(|completer| !completer.is_abandoned()))
    }

    pub fn pending_polls(&self) -> usize {
        self.polls
            .iter()
            .filter(|waiter| !waiter.completer.is_abandoned())
            .count()
    }

    pub fn pending_events(&self, name: &str) -> usize {
        self.events
            .get(name)
            .map(|queue| queue.iter().filter(|completer| !completer.is_abandoned()).count())
            .unwrap_or(0)
    }

    /// Drops every waiter without settling it; their completions stay
    /// pending forever.
    pub fn clear(&mut self) {
        self.polls.clear();
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Walker {
        arrived: Cell<bool>,
    }

    #[test]
    fn already_true_predicate_resolves_without_tick() {
        let mut resolver = BlockingResolver::<Walker>::new();
        let walker = Walker::default();
        walker.arrived.set(true);

        let completion = resolver.wait_until(&walker, 0.0, |walker, _| walker.arrived.get());
        assert!(completion.is_settled());
        assert!(!resolver.has_pending());
    }

    #[test]
    fn false_predicate_waits_for_a_tick_that_observes_it_true() {
        let mut resolver = BlockingResolver::<Walker>::new();
        let walker = Walker::default();

        let completion = resolver.wait_until(&walker, 0.0, |walker, _| walker.arrived.get());
        assert!(!completion.is_settled());

        assert_eq!(resolver.tick(&walker, 16.0), 0);
        assert_eq!(resolver.tick(&walker, 32.0), 0);
        assert!(!completion.is_settled());
        assert_eq!(resolver.pending_polls(), 1);

        walker.arrived.set(true);
        assert_eq!(resolver.tick(&walker, 48.0), 1);
        assert!(completion.is_settled());
        assert!(!resolver.has_pending());
    }

    #[test]
    fn tick_resolves_only_satisfied_predicates() {
        let mut resolver = BlockingResolver::<()>::new();
        let early = resolver.wait_until(&(), 0.0, |_, now| now >= 100.0);
        let late = resolver.wait_until(&(), 0.0, |_, now| now >= 500.0);

        assert_eq!(resolver.tick(&(), 100.0), 1);
        assert!(early.is_settled());
        assert!(!late.is_settled());
        assert_eq!(resolver.pending_polls(), 1);
    }

    #[test]
    fn predicate_is_evaluated_once_per_tick() {
        let mut resolver = BlockingResolver::<()>::new();
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let _completion = resolver.wait_until(&(), 0.0, move |_, _| {
            counter.set(counter.get() + 1);
            false
        });
        resolver.tick(&(), 1.0);
        resolver.tick(&(), 2.0);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn named_events_resolve_oldest_waiter_first() {
        let mut resolver = BlockingResolver::<()>::new();
        let first = resolver.wait_for_named("dialog-closed");
        let second = resolver.wait_for_named("dialog-closed");
        assert_eq!(resolver.pending_events("dialog-closed"), 2);

        assert!(resolver.resolve_named("dialog-closed", ScriptValue::from("v1")));
        assert_eq!(first.value(), Some(ScriptValue::from("v1")));
        assert!(!second.is_settled());

        assert!(resolver.resolve_named("dialog-closed", ScriptValue::from("v2")));
        assert_eq!(second.value(), Some(ScriptValue::from("v2")));
        assert!(!resolver.has_pending());
    }

    #[test]
    fn resolving_unknown_event_is_a_no_op() {
        let mut resolver = BlockingResolver::<()>::new();
        let waiting = resolver.wait_for_named("choice");
        assert!(!resolver.resolve_named("other", ScriptValue::Null));
        assert!(!waiting.is_settled());
        assert!(resolver.has_pending());
    }

    #[test]
    fn abandoned_event_waiters_are_skipped() {
        let mut resolver = BlockingResolver::<()>::new();
        let dropped = resolver.wait_for_named("choice");
        let live = resolver.wait_for_named("choice");
        drop(dropped);
        assert_eq!(resolver.pending_events("choice"), 1);

        assert!(resolver.resolve_named("choice", ScriptValue::from(1)));
        assert_eq!(live.value(), Some(ScriptValue::from(1)));
        assert!(!resolver.has_pending());
    }

    #[test]
    fn abandoned_waiters_do_not_count_as_pending() {
        let mut resolver = BlockingResolver::<()>::new();
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let poll = resolver.wait_until(&(), 0.0, move |_, _| {
            counter.set(counter.get() + 1);
            false
        });
        let event = resolver.wait_for_named("choice");
        drop(poll);
        drop(event);

        assert!(!resolver.has_pending());
        assert_eq!(resolver.pending_polls(), 0);
        assert_eq!(resolver.tick(&(), 10.0), 0);
        assert_eq!(calls.get(), 1);
        assert!(!resolver.resolve_named("choice", ScriptValue::Null));
        assert_eq!(resolver.pending_events("choice"), 0);
    }

    #[test]
    fn clear_drops_waiters_without_settling() {
        let mut resolver = BlockingResolver::<()>::new();
        let poll = resolver.wait_until(&(), 0.0, |_, _| false);
        let event = resolver.wait_for_named("choice");
        resolver.clear();

        assert!(!resolver.has_pending());
        assert_eq!(resolver.tick(&(), 10.0), 0);
        assert!(!resolver.resolve_named("choice", ScriptValue::Null));
        assert!(!poll.is_settled());
        assert!(!event.is_settled());
    }
}
