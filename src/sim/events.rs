//! Listener registration for motor notifications.
//! Delivery is synchronous, inside the tick that produced the event.

/// Id handed back by `connect`, used to disconnect later.
pub type ConnectionId = u64;

/// Zero-argument jump notification with explicit listener registration.
pub struct JumpSignal {
    next_id: ConnectionId,
    listeners: Vec<(ConnectionId, Box<dyn FnMut() + Send + Sync>)>,
}

impl JumpSignal {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener, returning its connection id
    pub fn connect(&mut self, listener: impl FnMut() + Send + Sync + 'static) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a previously registered listener
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Invokes every registered listener in registration order
    pub fn fire(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for JumpSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_connect_fire_disconnect() {
        let count = Arc::new(AtomicU32::new(0));
        let mut signal = JumpSignal::new();

        let c1 = Arc::clone(&count);
        let id1 = signal.connect(move || {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&count);
        let _id2 = signal.connect(move || {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        signal.fire();
        assert_eq!(count.load(Ordering::SeqCst), 11);

        assert!(signal.disconnect(id1));
        assert!(!signal.disconnect(id1), "Double disconnect should be a no-op");
        signal.fire();
        assert_eq!(count.load(Ordering::SeqCst), 21);
        assert_eq!(signal.listener_count(), 1);
    }
}
