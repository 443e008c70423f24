//! Event sink: the listeners a session reports to.
//!
//! There are four events. Listeners register per event kind and are called
//! synchronously, in registration order, from whatever task drives the
//! session. A listener that wants to react asynchronously can use
//! [`Listeners::forward`] to receive a tagged [`ChatEvent`] stream instead.

use tmi_protocol::{ChatMessage, Notice};
use tokio::sync::mpsc;

/// A session event, as delivered through [`Listeners::forward`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Handshake sent; the session is authenticated.
    Ready,
    Message(ChatMessage),
    Notice(Notice),
    /// The transport closed. Raised at most once per session.
    Close,
}

impl ChatEvent {
    /// Lowercase event name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Message(_) => "message",
            Self::Notice(_) => "notice",
            Self::Close => "close",
        }
    }
}

type SignalListener = Box<dyn FnMut() + Send>;
type MessageListener = Box<dyn FnMut(&ChatMessage) + Send>;
type NoticeListener = Box<dyn FnMut(&Notice) + Send>;

/// Registered listeners, one list per event kind.
#[derive(Default)]
pub struct Listeners {
    ready: Vec<SignalListener>,
    message: Vec<MessageListener>,
    notice: Vec<NoticeListener>,
    close: Vec<SignalListener>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_ready(&mut self, listener: impl FnMut() + Send + 'static) -> &mut Self {
        self.ready.push(Box::new(listener));
        self
    }

    pub fn on_message(
        &mut self,
        listener: impl FnMut(&ChatMessage) + Send + 'static,
    ) -> &mut Self {
        self.message.push(Box::new(listener));
        self
    }

    pub fn on_notice(
        &mut self,
        listener: impl FnMut(&Notice) + Send + 'static,
    ) -> &mut Self {
        self.notice.push(Box::new(listener));
        self
    }

    pub fn on_close(&mut self, listener: impl FnMut() + Send + 'static) -> &mut Self {
        self.close.push(Box::new(listener));
        self
    }

    /// Registers one listener per event kind that forwards every event
    /// into `tx`. Events are dropped silently once the receiver is gone.
    pub fn forward(&mut self, tx: mpsc::UnboundedSender<ChatEvent>) -> &mut Self {
        let ready = tx.clone();
        let message = tx.clone();
        let notice = tx.clone();
        let close = tx;
        self.on_ready(move || {
            let _ = ready.send(ChatEvent::Ready);
        })
        .on_message(move |msg| {
            let _ = message.send(ChatEvent::Message(msg.clone()));
        })
        .on_notice(move |n| {
            let _ = notice.send(ChatEvent::Notice(n.clone()));
        })
        .on_close(move || {
            let _ = close.send(ChatEvent::Close);
        })
    }

    /// Delivers `event` to every listener registered for its kind.
    pub fn emit(&mut self, event: &ChatEvent) {
        tracing::trace!(event = event.name(), "emitting event");
        match event {
            ChatEvent::Ready => self.ready.iter_mut().for_each(|l| l()),
            ChatEvent::Message(msg) => self.message.iter_mut().for_each(|l| l(msg)),
            ChatEvent::Notice(notice) => {
                self.notice.iter_mut().for_each(|l| l(notice))
            }
            ChatEvent::Close => self.close.iter_mut().for_each(|l| l()),
        }
    }

    /// Total number of registered listeners across all kinds.
    pub fn len(&self) -> usize {
        self.ready.len() + self.message.len() + self.notice.len() + self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("ready", &self.ready.len())
            .field("message", &self.message.len())
            .field("notice", &self.notice.len())
            .field("close", &self.close.len())
            .finish()
    }
}
