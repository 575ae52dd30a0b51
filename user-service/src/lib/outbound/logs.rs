//! Log persistence in MongoDB.
//!
//! [`MongoLogSink`] is a `MakeWriter` for a JSON `fmt` layer. Each formatted
//! event is handed over a bounded channel to one background task that
//! reshapes it into a document and inserts it into the configured collection.
//! Event producers never wait on the database: when the queue is full the
//! event is dropped.

use std::future::Future;
use std::io;
use std::time::Duration;

use mongodb::bson::Bson;
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::Document;
use mongodb::Client;
use mongodb::Collection;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::MongoLogConfig;

const INSERT_TIMEOUT: Duration = Duration::from_secs(5);
const QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum LogSinkError {
    #[error("Log store unavailable: {0}")]
    Unavailable(#[from] mongodb::error::Error),

    #[error("Malformed log event: {0}")]
    Malformed(String),

    #[error("Log store timed out")]
    Timeout,
}

/// Writer factory shipping every formatted event to MongoDB.
#[derive(Clone)]
pub struct MongoLogSink {
    sender: mpsc::Sender<Vec<u8>>,
}

impl MongoLogSink {
    /// Connect to MongoDB and start the insert task.
    ///
    /// The task ends once every clone of the sink is dropped.
    ///
    /// # Errors
    /// * `Unavailable` - URL is invalid or the server cannot be reached
    pub async fn connect(config: &MongoLogConfig) -> Result<Self, LogSinkError> {
        let client = Client::with_uri_str(&config.url).await?;
        let database = client.database(&config.database);
        // Fail at startup rather than on the first event.
        database.run_command(mongodb::bson::doc! { "ping": 1 }, None).await?;

        let collection = database.collection::<Document>(&config.collection);
        let (sink, receiver) = Self::channel(QUEUE_CAPACITY);
        tokio::spawn(store_events(receiver, collection));

        Ok(sink)
    }

    fn channel(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

async fn store_events(mut receiver: mpsc::Receiver<Vec<u8>>, collection: Collection<Document>) {
    while let Some(line) = receiver.recv().await {
        // Reported on stderr: logging the failure through tracing would feed it back here.
        let document = match to_log_document(&line) {
            Ok(document) => document,
            Err(e) => {
                eprintln!("log sink: {e}");
                continue;
            }
        };

        if let Err(e) = bounded(INSERT_TIMEOUT, collection.insert_one(document, None)).await {
            eprintln!("log sink: insert failed: {e}");
        }
    }
}

async fn bounded<T, F>(limit: Duration, insert: F) -> Result<T, LogSinkError>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    tokio::time::timeout(limit, insert)
        .await
        .map_err(|_| LogSinkError::Timeout)?
        .map_err(LogSinkError::from)
}

/// Buffers one formatted event and sends it when dropped.
pub struct EventWriter {
    sender: mpsc::Sender<Vec<u8>>,
    buffer: Vec<u8>,
}

impl io::Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        match self.sender.try_send(std::mem::take(&mut self.buffer)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                eprintln!("log sink: queue full, event dropped");
            }
            // Insert task is gone.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl<'a> MakeWriter<'a> for MongoLogSink {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            sender: self.sender.clone(),
            buffer: Vec::new(),
        }
    }
}

/// Reshape one JSON event line into the stored document.
///
/// Fixed fields: `time`, `level`, `caller`, `msg`. Event fields and the
/// fields of the innermost span (request `method`, `uri`, `request_id`) are
/// copied alongside them.
fn to_log_document(line: &[u8]) -> Result<Document, LogSinkError> {
    let event: Map<String, Value> =
        serde_json::from_slice(line).map_err(|e| LogSinkError::Malformed(e.to_string()))?;

    let mut document = Document::new();

    if let Some(Value::String(timestamp)) = event.get("timestamp") {
        let time = BsonDateTime::parse_rfc3339_str(timestamp)
            .map(Bson::DateTime)
            .unwrap_or_else(|_| Bson::String(timestamp.clone()));
        document.insert("time", time);
    }
    if let Some(Value::String(level)) = event.get("level") {
        document.insert("level", level.to_lowercase());
    }
    if let Some(Value::String(target)) = event.get("target") {
        document.insert("caller", target.as_str());
    }

    if let Some(Value::Object(span)) = event.get("span") {
        copy_fields(&mut document, span);
    }
    if let Some(Value::Object(fields)) = event.get("fields") {
        if let Some(Value::String(message)) = fields.get("message") {
            document.insert("msg", message.as_str());
        }
        copy_fields(&mut document, fields);
    }

    Ok(document)
}

fn copy_fields(document: &mut Document, fields: &Map<String, Value>) {
    for (key, value) in fields {
        if key == "message" || key == "name" {
            continue;
        }
        let value =
            mongodb::bson::to_bson(value).unwrap_or_else(|_| Bson::String(value.to_string()));
        document.insert(key.as_str(), value);
    }
}
