use crate::error::SignalError;
use crate::model::ClientSignal;

/// Outbound half of the signaling transport.
pub trait SignalSink {
    fn send(&self, signal: ClientSignal) -> Result<(), SignalError>;
}

impl<S: SignalSink + ?Sized> SignalSink for std::rc::Rc<S> {
    fn send(&self, signal: ClientSignal) -> Result<(), SignalError> {
        (**self).send(signal)
    }
}
