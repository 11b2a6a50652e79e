//! Notify-only event bus.
//!
//! Every state change that clients may want to observe is published here
//! after the mutation has been committed. Delivery is at-most-once and
//! best-effort: a publish never fails the caller, and listeners that fall
//! behind lose the oldest events.

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::Task;

pub const TASK_UPDATE: &str = "task_update";
pub const USER_SESSION_UPDATE: &str = "user_session_update";

/// Largest buffer a bus may be created with.
pub const MAX_EVENT_BUS_CAPACITY: usize = 65_536;

/// A named notification with a JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Event {
    pub channel: &'static str,
    pub payload: Value,
}

impl Event {
    pub fn task_created(task: &Task) -> Self {
        Self {
            channel: TASK_UPDATE,
            payload: json!({ "message": "New task added", "task": task }),
        }
    }

    pub fn task_updated(task: &Task) -> Self {
        Self {
            channel: TASK_UPDATE,
            payload: json!({ "message": "Task updated", "task": task }),
        }
    }

    pub fn task_deleted(task_id: Uuid) -> Self {
        Self {
            channel: TASK_UPDATE,
            payload: json!({ "message": "Task deleted", "taskId": task_id }),
        }
    }

    pub fn user_login(user_id: Uuid) -> Self {
        Self {
            channel: USER_SESSION_UPDATE,
            payload: json!({ "userId": user_id, "status": "login" }),
        }
    }

    pub fn user_logout(user_id: Uuid) -> Self {
        Self {
            channel: USER_SESSION_UPDATE,
            payload: json!({ "userId": user_id, "status": "logout" }),
        }
    }

    /// Renders the event as one Server-Sent Events frame.
    pub fn to_sse_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.channel, self.payload)
    }
}

/// Fan-out channel handed to every component that publishes.
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is clamped to `1..=MAX_EVENT_BUS_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_BUS_CAPACITY));
        Self { sender }
    }

    /// Fire-and-forget publish. Having no listeners is not an error worth
    /// surfacing; it is logged at debug level and dropped.
    pub fn publish(&self, event: Event) {
        let channel = event.channel;
        match self.sender.send(event) {
            Ok(listeners) => log::debug!("published {} to {} listener(s)", channel, listeners),
            Err(_) => log::debug!("dropped {} event: no listeners", channel),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
