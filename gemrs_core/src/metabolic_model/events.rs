//! Change notification for model observers
use std::fmt::{Debug, Formatter};

/// Structural or content change applied to a model
#[derive(Clone, Debug, PartialEq)]
pub enum ModelChange {
    CompartmentAdded(String),
    MetaboliteAdded(String),
    MetaboliteUpdated(String),
    MetaboliteRemoved(String),
    GeneAdded(String),
    GeneRemoved(String),
    ReactionAdded(String),
    ReactionUpdated(String),
    ReactionRemoved(String),
    ReferenceAdded(String),
    ReferenceRemoved(String),
    EvidenceAdded(String),
    EvidenceRemoved(String),
    TestCaseAdded(String),
    TestCaseRemoved(String),
}

/// Handle returned by [`ChangeNotifier::subscribe`], used to unsubscribe again
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&ModelChange)>;

/// List of registered observers
///
/// Listeners are not carried over when a model is cloned.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: usize,
}

impl ChangeNotifier {
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ModelChange) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    pub fn notify(&mut self, change: ModelChange) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

impl Clone for ChangeNotifier {
    fn clone(&self) -> Self {
        ChangeNotifier::default()
    }
}

impl Debug for ChangeNotifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChangeNotifier({} listeners)", self.listeners.len())
    }
}
