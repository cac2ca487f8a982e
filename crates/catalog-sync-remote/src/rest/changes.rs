use crate::feed::FeedSender;
use catalog_sync_models::{ChangeEvent, Collection, ItemId, RawRecord};
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Payload of one message on the change feed:
/// `{"eventType":"UPDATE","table":"movies","new":{...},"old":{"id":4}}`
#[derive(Debug, Deserialize)]
struct ChangePayload {
    #[serde(rename = "eventType", alias = "type")]
    event_type: String,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    new: Option<RawRecord>,
    #[serde(default)]
    old: Option<RawRecord>,
}

/// Decode one feed message. Unknown event types and payloads that do not
/// identify a row yield `None`.
pub fn parse_change(collection: Collection, data: &str) -> Result<Option<ChangeEvent>, serde_json::Error> {
    let payload: ChangePayload = serde_json::from_str(data)?;

    let event = match payload.event_type.to_ascii_uppercase().as_str() {
        "INSERT" => payload
            .new
            .filter(|r| r.id.is_some())
            .map(|record| ChangeEvent::insert(collection, record)),
        "UPDATE" => payload
            .new
            .filter(|r| r.id.is_some())
            .map(|record| ChangeEvent::update(collection, record)),
        "DELETE" => payload
            .old
            .and_then(|r| r.id)
            .map(|id: ItemId| ChangeEvent::delete(collection, id)),
        _ => None,
    };
    Ok(event)
}

/// Run the server-sent change stream for one table until the feed is
/// dropped or the server refuses the stream.
pub fn spawn_change_stream(client: Arc<Client>, url: String, table: String, sender: FeedSender) {
    tokio::spawn(async move {
        let request = client.get(&url).query(&[("table", table.as_str())]);
        let mut source = match EventSource::new(request) {
            Ok(source) => source,
            Err(e) => {
                warn!("Cannot open change stream for {}: {}", table, e);
                return;
            }
        };

        let collection = sender.collection();
        loop {
            tokio::select! {
                _ = sender.closed() => {
                    debug!("Change feed for {} closed by subscriber", table);
                    break;
                }
                event = source.next() => {
                    match event {
                        Some(Ok(Event::Open)) => {
                            info!("Change stream open for {}", table);
                        }
                        Some(Ok(Event::Message(message))) => {
                            match parse_change(collection, &message.data) {
                                Ok(Some(change)) => {
                                    if !sender.send(change) {
                                        break;
                                    }
                                }
                                Ok(None) => {
                                    debug!("Ignoring {} message on {} feed", message.event, table);
                                }
                                Err(e) => {
                                    warn!("Malformed change payload on {} feed: {}", table, e);
                                }
                            }
                        }
                        Some(Err(EventSourceError::InvalidStatusCode(..)))
                        | Some(Err(EventSourceError::InvalidContentType(..))) => {
                            warn!("Change stream for {} rejected by server", table);
                            break;
                        }
                        Some(Err(e)) => {
                            // The event source reconnects on its own
                            warn!("Change stream error for {}: {}", table, e);
                        }
                        None => break,
                    }
                }
            }
        }

        source.close();
        debug!("Change stream for {} stopped", table);
    });
}
