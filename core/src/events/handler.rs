use super::GameSignal;

/// Receives every signal a session produces.
pub trait SignalHandler {
    fn handle_signal(&mut self, signal: &GameSignal);

    /// Handle a batch of signals in production order.
    fn handle_signals(&mut self, signals: &[GameSignal]) {
        for signal in signals {
            self.handle_signal(signal);
        }
    }
}
