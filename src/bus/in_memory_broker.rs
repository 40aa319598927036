//! In-memory partitioned broker for testing and single-process deployments.
//!
//! Models the parts of a log-based broker the replication pipeline relies on:
//! - Topics split into a fixed number of partitions
//! - Key-based partition assignment (same key → same partition → same order)
//! - Consumer groups with committed offsets
//! - Blocking poll with a timeout (condition variable, no busy wait)

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{BusError, Connection, ConnectionState, Message, Publisher, Record, Subscriber};

struct BrokerState {
    /// topic → partition logs
    topics: HashMap<String, Vec<Vec<Message>>>,
    /// (group, topic, partition) → next offset to read
    committed: HashMap<(String, String, u32), u64>,
    /// When set, every publish is rejected with this reason.
    publish_fault: Option<String>,
}

struct Shared {
    state: Mutex<BrokerState>,
    arrived: Condvar,
    partitions: u32,
}

/// In-memory partitioned broker.
///
/// Clone-friendly via `Arc`: every clone, producer and consumer handle shares
/// the same logs and offsets.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use itemsync::bus::{Connection, InMemoryBroker, Message, Publisher, Subscriber};
///
/// let broker = InMemoryBroker::new(3);
/// let producer = broker.producer();
/// producer.connect().unwrap();
/// producer
///     .publish(Message::with_string_payload("m-1", "item-events", "{}").with_key("A1"))
///     .unwrap();
///
/// let consumer = broker.consumer("replica", "item-events");
/// consumer.connect().unwrap();
/// let record = consumer.poll(Duration::from_millis(10)).unwrap().unwrap();
/// assert_eq!(record.key(), Some("A1"));
/// consumer.ack(&record).unwrap();
/// ```
#[derive(Clone)]
pub struct InMemoryBroker {
    shared: Arc<Shared>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(1)
    }
}

impl InMemoryBroker {
    /// Create a broker whose topics have `partitions` partitions (at least one).
    pub fn new(partitions: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BrokerState {
                    topics: HashMap::new(),
                    committed: HashMap::new(),
                    publish_fault: None,
                }),
                arrived: Condvar::new(),
                partitions: partitions.max(1),
            }),
        }
    }

    pub fn partitions(&self) -> u32 {
        self.shared.partitions
    }

    /// Partition a key is routed to. Keyless messages go to partition 0.
    pub fn partition_for(&self, key: Option<&str>) -> u32 {
        match key {
            None => 0,
            Some(key) => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                (hasher.finish() % u64::from(self.shared.partitions)) as u32
            }
        }
    }

    /// Create a producer handle. It must be connected before publishing.
    pub fn producer(&self) -> InMemoryProducer {
        InMemoryProducer {
            broker: self.clone(),
            connection: Arc::new(ConnectionState::new()),
        }
    }

    /// Create a consumer handle in `group_id` subscribed to `topic`.
    pub fn consumer(&self, group_id: impl Into<String>, topic: impl Into<String>) -> InMemoryConsumer {
        InMemoryConsumer {
            broker: self.clone(),
            group_id: group_id.into(),
            topic: topic.into(),
            connection: ConnectionState::new(),
            cursor: Mutex::new(Cursor::default()),
        }
    }

    /// All records of a topic, ordered by partition then offset.
    pub fn records(&self, topic: &str) -> Vec<Record> {
        let Ok(state) = self.lock() else {
            return Vec::new();
        };
        state
            .topics
            .get(topic)
            .map(|partitions| {
                partitions
                    .iter()
                    .enumerate()
                    .flat_map(|(partition, log)| {
                        log.iter().enumerate().map(move |(offset, message)| Record {
                            partition: partition as u32,
                            offset: offset as u64,
                            message: message.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of records in a topic across all partitions.
    pub fn len(&self, topic: &str) -> usize {
        self.lock()
            .map(|state| {
                state
                    .topics
                    .get(topic)
                    .map(|partitions| partitions.iter().map(Vec::len).sum())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self, topic: &str) -> bool {
        self.len(topic) == 0
    }

    /// Committed offset (next offset to read) of a group on a partition.
    pub fn committed_offset(&self, group_id: &str, topic: &str, partition: u32) -> Option<u64> {
        self.lock().ok().and_then(|state| {
            state
                .committed
                .get(&(group_id.to_string(), topic.to_string(), partition))
                .copied()
        })
    }

    /// Reject every publish with `reason` until [`restore_publishes`](Self::restore_publishes).
    pub fn fail_publishes(&self, reason: impl Into<String>) {
        if let Ok(mut state) = self.lock() {
            state.publish_fault = Some(reason.into());
        }
    }

    pub fn restore_publishes(&self) {
        if let Ok(mut state) = self.lock() {
            state.publish_fault = None;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BrokerState>, BusError> {
        self.shared
            .state
            .lock()
            .map_err(|_| BusError::ConnectionFailed("broker state lock poisoned".into()))
    }

    fn append(&self, messages: Vec<Message>) -> Result<(), BusError> {
        let partitions = self.shared.partitions as usize;
        let mut state = self.lock()?;

        if let Some(reason) = &state.publish_fault {
            return Err(BusError::Rejected(reason.clone()));
        }

        for message in messages {
            let partition = self.partition_for(message.key.as_deref()) as usize;
            let logs = state
                .topics
                .entry(message.topic.clone())
                .or_insert_with(|| vec![Vec::new(); partitions]);
            debug!(
                topic = %message.topic,
                partition,
                offset = logs[partition].len(),
                "message appended"
            );
            logs[partition].push(message);
        }

        drop(state);
        self.shared.arrived.notify_all();
        Ok(())
    }
}

/// Producer handle for an [`InMemoryBroker`].
#[derive(Clone)]
pub struct InMemoryProducer {
    broker: InMemoryBroker,
    connection: Arc<ConnectionState>,
}

impl Connection for InMemoryProducer {
    fn connect(&self) -> Result<(), BusError> {
        if self.connection.open()? {
            info!("producer connected");
        }
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BusError> {
        if self.connection.close() {
            info!("producer disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_open()
    }
}

impl Publisher for InMemoryProducer {
    fn publish(&self, message: Message) -> Result<(), BusError> {
        self.connection.ensure_open()?;
        self.broker.append(vec![message])
    }

    fn publish_batch(&self, messages: Vec<Message>) -> Result<(), BusError> {
        self.connection.ensure_open()?;
        self.broker.append(messages)
    }
}

#[derive(Default)]
struct Cursor {
    /// partition → next offset to hand out
    positions: HashMap<u32, u64>,
    /// partition to try first on the next poll
    next_partition: u32,
}

/// Consumer handle for an [`InMemoryBroker`], a member of a consumer group.
///
/// Records are handed out in offset order within each partition; partitions
/// are visited round-robin. On connect the handle resumes from the group's
/// committed offsets.
pub struct InMemoryConsumer {
    broker: InMemoryBroker,
    group_id: String,
    topic: String,
    connection: ConnectionState,
    cursor: Mutex<Cursor>,
}

impl InMemoryConsumer {
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn cursor(&self) -> Result<MutexGuard<'_, Cursor>, BusError> {
        self.cursor
            .lock()
            .map_err(|_| BusError::ConnectionFailed("consumer cursor lock poisoned".into()))
    }

    fn next_record(&self, state: &BrokerState) -> Result<Option<Record>, BusError> {
        let Some(logs) = state.topics.get(&self.topic) else {
            return Ok(None);
        };

        let mut cursor = self.cursor()?;
        let partitions = logs.len() as u32;

        for step in 0..partitions {
            let partition = (cursor.next_partition + step) % partitions;
            let position = cursor.positions.get(&partition).copied().unwrap_or(0);

            if let Some(message) = logs[partition as usize].get(position as usize) {
                cursor.positions.insert(partition, position + 1);
                cursor.next_partition = (partition + 1) % partitions;
                return Ok(Some(Record {
                    partition,
                    offset: position,
                    message: message.clone(),
                }));
            }
        }

        Ok(None)
    }
}

impl Connection for InMemoryConsumer {
    fn connect(&self) -> Result<(), BusError> {
        if !self.connection.open()? {
            return Ok(());
        }

        let state = self.broker.lock()?;
        let mut cursor = self.cursor()?;
        for partition in 0..self.broker.partitions() {
            let committed = state
                .committed
                .get(&(self.group_id.clone(), self.topic.clone(), partition))
                .copied()
                .unwrap_or(0);
            cursor.positions.insert(partition, committed);
        }

        info!(group_id = %self.group_id, topic = %self.topic, "consumer connected");
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BusError> {
        if self.connection.close() {
            // Wake any poll blocked on this handle so it can observe the close.
            self.broker.shared.arrived.notify_all();
            info!(group_id = %self.group_id, topic = %self.topic, "consumer disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_open()
    }
}

impl Subscriber for InMemoryConsumer {
    fn poll(&self, timeout: Duration) -> Result<Option<Record>, BusError> {
        self.connection.ensure_open()?;
        let deadline = Instant::now() + timeout;
        let mut state = self.broker.lock()?;

        loop {
            if let Some(record) = self.next_record(&state)? {
                return Ok(Some(record));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            let (guard, _) = self
                .broker
                .shared
                .arrived
                .wait_timeout(state, deadline - now)
                .map_err(|_| BusError::ConnectionFailed("broker state lock poisoned".into()))?;
            state = guard;

            self.connection.ensure_open()?;
        }
    }

    fn ack(&self, record: &Record) -> Result<(), BusError> {
        self.connection.ensure_open()?;
        let mut state = self.broker.lock()?;
        let committed = state
            .committed
            .entry((self.group_id.clone(), self.topic.clone(), record.partition))
            .or_insert(0);
        *committed = (*committed).max(record.offset + 1);
        Ok(())
    }

    fn nack(&self, record: &Record, reason: &str) -> Result<(), BusError> {
        self.connection.ensure_open()?;
        let mut cursor = self.cursor()?;
        let position = cursor.positions.entry(record.partition).or_insert(0);
        if record.offset < *position {
            *position = record.offset;
        }
        debug!(
            partition = record.partition,
            offset = record.offset,
            reason,
            "record rewound for redelivery"
        );
        Ok(())
    }
}
