pub mod convert;
pub mod webhook;

use async_trait::async_trait;
use tokio::sync::broadcast;

use std::fmt::Debug;

use api::response::Session;

/// Published by the session registry on every state change.
#[derive(Clone, Debug)]
pub enum Event {
    Session(Session),
}

#[async_trait]
pub trait EventHook: Debug {
    async fn hook(&self, mut event_receiver: broadcast::Receiver<Event>);
}
