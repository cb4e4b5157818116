use std::{collections::HashMap, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use super::messages::ServerMessage;

/// A live viewer registered for one game's broadcasts
#[derive(Debug)]
pub struct Subscription {
    pub connection_id: Uuid,
    pub receiver: mpsc::Receiver<ServerMessage>,
}

/// Delivery counts for a single publish
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Per-game sets of live subscribers.
///
/// Membership for a game is only touched under that game's map entry, so
/// concurrent connects, disconnects and publishes cannot lose updates. Sends
/// happen after the entry is released.
#[derive(Debug)]
pub struct BroadcastRegistry {
    games: DashMap<i64, HashMap<Uuid, mpsc::Sender<ServerMessage>>>,
    buffer: usize,
    send_timeout: Duration,
}

impl BroadcastRegistry {
    pub fn new(buffer: usize, send_timeout: Duration) -> Self {
        Self {
            games: DashMap::new(),
            buffer: buffer.max(1),
            send_timeout,
        }
    }

    /// Register a new connection for the game
    pub fn subscribe(&self, game_id: i64) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let connection_id = Uuid::new_v4();

        self.games
            .entry(game_id)
            .or_default()
            .insert(connection_id, tx);

        tracing::debug!(game_id, %connection_id, "Subscriber registered");

        Subscription {
            connection_id,
            receiver: rx,
        }
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn unsubscribe(&self, game_id: i64, connection_id: Uuid) -> bool {
        let removed = match self.games.get_mut(&game_id) {
            Some(mut subscribers) => subscribers.remove(&connection_id).is_some(),
            None => false,
        };

        // Drop the game's entry once nobody is watching
        self.games
            .remove_if(&game_id, |_, subscribers| subscribers.is_empty());

        if removed {
            tracing::debug!(game_id, %connection_id, "Subscriber removed");
        }
        removed
    }

    /// Drop every subscriber of the game. Their feeds end once drained.
    pub fn close_game(&self, game_id: i64) -> usize {
        let closed = self
            .games
            .remove(&game_id)
            .map(|(_, subscribers)| subscribers.len())
            .unwrap_or(0);
        if closed > 0 {
            tracing::debug!(game_id, closed, "Closed live feed for game");
        }
        closed
    }

    pub fn subscriber_count(&self, game_id: i64) -> usize {
        self.games.get(&game_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Send a message to every current subscriber of the game.
    ///
    /// Each send is independent and bounded by the send timeout. Closed
    /// connections are pruned; failures never reach the caller.
    pub async fn publish(&self, game_id: i64, message: ServerMessage) -> PublishReport {
        let targets: Vec<(Uuid, mpsc::Sender<ServerMessage>)> = match self.games.get(&game_id) {
            Some(subscribers) => subscribers
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect(),
            None => return PublishReport::default(),
        };

        let send_timeout = self.send_timeout;
        let outcomes = futures::future::join_all(targets.into_iter().map(|(connection_id, tx)| {
            let message = message.clone();
            async move {
                let outcome = tokio::time::timeout(send_timeout, tx.send(message)).await;
                (connection_id, outcome)
            }
        }))
        .await;

        let mut report = PublishReport::default();
        for (connection_id, outcome) in outcomes {
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(_)) => {
                    report.failed += 1;
                    tracing::debug!(game_id, %connection_id, "Subscriber closed, pruning");
                    self.unsubscribe(game_id, connection_id);
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::warn!(
                        game_id,
                        %connection_id,
                        timeout_ms = send_timeout.as_millis() as u64,
                        "Subscriber send timed out, message dropped"
                    );
                }
            }
        }

        tracing::info!(
            game_id,
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast result to live viewers"
        );
        report
    }

    /// Publish on a detached task so the caller never waits on subscribers
    /// and cancelling the caller cannot cancel the fan-out
    pub fn spawn_publish(
        self: &Arc<Self>,
        game_id: i64,
        message: ServerMessage,
    ) -> JoinHandle<PublishReport> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.publish(game_id, message).await })
    }
}
