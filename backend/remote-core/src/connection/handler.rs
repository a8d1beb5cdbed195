use crate::protocol::Message;

/// Receives every successfully decoded inbound message.
///
/// Called from the manager task, one message at a time, in arrival order. It
/// must not block: long work belongs on its own task.
pub trait MessageHandler: Send + 'static {
    fn on_message(&mut self, message: Message);
}

impl<F> MessageHandler for F
where
    F: FnMut(Message) + Send + 'static,
{
    fn on_message(&mut self, message: Message) {
        self(message)
    }
}
