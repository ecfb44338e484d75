//! Request/response correlation layer over the transport.
//!
//! Outbound calls get a sequential id and a oneshot callback; the
//! dispatch loop correlates responses by id and maintains a registry of
//! remote objects announced by the driver through `__create__` events.
//! The registry stores each object's type name and initializer state;
//! `navigated` events keep frame URLs current so the final resolved URL
//! of a navigation can be read back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Notify, mpsc, oneshot};
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::transport::PipeTransport;

/// Metadata attached to every protocol request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Unix timestamp in milliseconds
    #[serde(rename = "wallTime")]
    pub wall_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<bool>,
}

impl Metadata {
    fn now() -> Self {
        Self {
            wall_time: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0),
            internal: Some(false),
        }
    }
}

/// Protocol request message sent to the driver.
#[derive(Debug, Clone, Serialize)]
struct Request {
    id: u32,
    guid: String,
    method: String,
    params: Value,
    metadata: Metadata,
}

/// Protocol response message from the driver.
#[derive(Debug, Clone, Deserialize)]
struct Response {
    id: u32,
    result: Option<Value>,
    error: Option<ErrorWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorWrapper {
    error: ErrorPayload,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorPayload {
    message: String,
    name: Option<String>,
    stack: Option<String>,
}

/// Protocol event message from the driver.
#[derive(Debug, Clone, Deserialize)]
struct Event {
    guid: String,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Discriminated union of inbound protocol messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Message {
    Response(Response),
    Event(Event),
    Unknown(Value),
}

/// A remote protocol object announced by the driver.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    /// Protocol type name (e.g. "Browser", "Page", "Frame")
    pub type_name: String,
    /// Current state, seeded from the `__create__` initializer
    pub state: Value,
}

/// JSON connection to the Playwright driver.
pub struct Connection {
    /// Sequential request id counter
    last_id: AtomicU32,
    /// Pending request callbacks keyed by request id
    callbacks: Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>,
    /// Queue of outbound messages consumed by the writer task
    outbound_tx: mpsc::UnboundedSender<Value>,
    /// Writer-task receiver, taken once by `run()`
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Registry of remote objects by guid
    objects: Mutex<HashMap<String, RemoteObject>>,
    /// Broadcast when any object is registered
    object_registered: Notify,
}

impl Connection {
    /// Create a new, not-yet-running connection.
    pub fn new() -> Arc<Self> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            last_id: AtomicU32::new(0),
            callbacks: Mutex::new(HashMap::new()),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            objects: Mutex::new(HashMap::new()),
            object_registered: Notify::new(),
        })
    }

    /// Send a message to the driver and await its response.
    pub async fn send(&self, guid: &str, method: &str, params: Value) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(id, guid, method, "sending protocol request");

        let (tx, rx) = oneshot::channel();
        self.callbacks
            .lock()
            .expect("callback map poisoned")
            .insert(id, tx);

        let request = Request {
            id,
            guid: guid.to_string(),
            method: method.to_string(),
            params,
            metadata: Metadata::now(),
        };

        let request_value = serde_json::to_value(&request)?;
        if self.outbound_tx.send(request_value).is_err() {
            self.callbacks
                .lock()
                .expect("callback map poisoned")
                .remove(&id);
            return Err(Error::ChannelClosed);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::ChannelClosed),
        }
    }

    /// Perform the protocol handshake and return the initialize response.
    pub async fn initialize(&self) -> Result<Value> {
        self.send(
            "",
            "initialize",
            serde_json::json!({ "sdkLanguage": "javascript" }),
        )
        .await
    }

    /// Look up a remote object by guid.
    pub fn object(&self, guid: &str) -> Result<RemoteObject> {
        self.objects
            .lock()
            .expect("object registry poisoned")
            .get(guid)
            .cloned()
            .ok_or_else(|| Error::ObjectNotFound(guid.to_string()))
    }

    /// Wait for a remote object to be registered.
    ///
    /// Responses can reference objects whose `__create__` event has not
    /// been dispatched yet, so lookups after a call may need to wait.
    pub async fn wait_for_object(&self, guid: &str, timeout: Duration) -> Result<RemoteObject> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.object_registered.notified();
            if let Ok(object) = self.object(guid) {
                return Ok(object);
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(Error::Timeout(format!("waiting for object {guid}")));
            }
            if tokio::time::timeout(deadline - now, notified).await.is_err() {
                return Err(Error::Timeout(format!("waiting for object {guid}")));
            }
        }
    }

    /// Run the transport and dispatch loops until the driver hangs up.
    pub async fn run<W, R>(
        self: Arc<Self>,
        transport: PipeTransport<W, R>,
        mut message_rx: mpsc::UnboundedReceiver<Value>,
    ) where
        W: AsyncWrite + Unpin + Send + 'static,
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (mut sender, receiver) = transport.into_parts();

        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .expect("outbound receiver poisoned")
            .take()
            .expect("run() can only be called once");

        let reader_handle = tokio::spawn(async move {
            if let Err(e) = receiver.run().await {
                error!("transport read error: {e}");
            }
        });

        let writer_handle = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = sender.send(message).await {
                    error!("transport write error: {e}");
                    break;
                }
            }
        });

        while let Some(message) = message_rx.recv().await {
            self.dispatch(message);
        }

        // Driver hung up; fail anything still in flight.
        let pending: Vec<_> = self
            .callbacks
            .lock()
            .expect("callback map poisoned")
            .drain()
            .collect();
        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ChannelClosed));
        }

        let _ = reader_handle.await;
        let _ = writer_handle.await;
    }

    /// Process one inbound protocol message.
    ///
    /// Normally driven by [`Connection::run`]; public so protocol
    /// handling can be exercised over raw messages.
    pub fn dispatch(&self, message: Value) {
        let message = match serde_json::from_value::<Message>(message) {
            Ok(m) => m,
            Err(e) => {
                error!("failed to parse protocol message: {e}");
                return;
            }
        };

        match message {
            Message::Response(response) => self.handle_response(response),
            Message::Event(event) => self.handle_event(event),
            Message::Unknown(value) => {
                debug!("unknown protocol message (ignored): {value}");
            }
        }
    }

    fn handle_response(&self, response: Response) {
        let callback = self
            .callbacks
            .lock()
            .expect("callback map poisoned")
            .remove(&response.id);

        let Some(callback) = callback else {
            error!(id = response.id, "response without a pending request");
            return;
        };

        let result = if let Some(wrapper) = response.error {
            let ErrorPayload {
                message,
                name,
                stack,
            } = wrapper.error;
            Err(Error::Remote {
                name: name.unwrap_or_else(|| "Error".to_string()),
                message,
                stack,
            })
        } else {
            Ok(response.result.unwrap_or(Value::Null))
        };

        let _ = callback.send(result);
    }

    fn handle_event(&self, event: Event) {
        match event.method.as_str() {
            "__create__" => {
                let Some(guid) = event.params["guid"].as_str() else {
                    error!("__create__ missing 'guid'");
                    return;
                };
                let type_name = event.params["type"].as_str().unwrap_or("").to_string();
                let initializer = event.params["initializer"].clone();
                debug!(guid, type_name, "__create__");

                self.objects
                    .lock()
                    .expect("object registry poisoned")
                    .insert(
                        guid.to_string(),
                        RemoteObject {
                            type_name,
                            state: initializer,
                        },
                    );
                self.object_registered.notify_waiters();
            }
            "__dispose__" => {
                self.objects
                    .lock()
                    .expect("object registry poisoned")
                    .remove(&event.guid);
            }
            "__adopt__" => {
                // Parent reassignment; the flat registry does not track hierarchy.
            }
            "navigated" => {
                // Keep frame URLs current so Page::url() reflects redirects.
                let mut objects = self.objects.lock().expect("object registry poisoned");
                if let Some(object) = objects.get_mut(&event.guid) {
                    if object.type_name == "Frame" {
                        if let Some(url) = event.params["url"].as_str() {
                            object.state["url"] = Value::String(url.to_string());
                        }
                    }
                }
            }
            _ => {
                debug!(guid = %event.guid, method = %event.method, "event ignored");
            }
        }
    }

    #[cfg(test)]
    fn pending_requests(&self) -> usize {
        self.callbacks.lock().expect("callback map poisoned").len()
    }
}
