//! Broker message and delivered record types.

/// A message to be published to a topic.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Unique identifier for this message
    pub id: String,
    /// Destination topic (e.g., "item-events")
    pub topic: String,
    /// Partition/ordering key. Messages sharing a key keep their relative order.
    pub key: Option<String>,
    /// Serialized payload (JSON text for item events)
    pub payload: Vec<u8>,
    /// Optional headers (event type, producer id, etc.)
    pub headers: Vec<(String, String)>,
}

impl Message {
    /// Create a new keyless message.
    pub fn new(id: impl Into<String>, topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            key: None,
            payload,
            headers: Vec::new(),
        }
    }

    /// Create a message with a string payload.
    pub fn with_string_payload(
        id: impl Into<String>,
        topic: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(id, topic, payload.into().into_bytes())
    }

    /// Set the partition/ordering key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add a header to the message.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// A message as delivered to a subscriber, with its position in the log.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub partition: u32,
    pub offset: u64,
    pub message: Message,
}

impl Record {
    pub fn key(&self) -> Option<&str> {
        self.message.key.as_deref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.message.payload
    }
}
