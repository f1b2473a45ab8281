use crate::dispatcher::UpdateQueue;
use crate::retry::{with_retry, RetryConfig};
use crate::telegram::TelegramClient;
use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

/// Pulls updates with `getUpdates` and feeds them to the dispatcher
pub struct Poller {
    client: TelegramClient,
    timeout: Duration,
    retry: RetryConfig,
}

impl Poller {
    pub fn new(client: TelegramClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            retry: RetryConfig::update_polling(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Poll until the dispatcher stops accepting updates
    pub async fn run(&self, queue: &UpdateQueue) -> Result<()> {
        info!("Polling Telegram for updates (timeout {:?})", self.timeout);
        let mut offset = 0;

        loop {
            match self.poll_once(offset, queue).await {
                Ok(next) => offset = next,
                Err(e) if queue.is_closed() => return Err(e),
                Err(e) => {
                    error!("Update polling failed, backing off: {:#}", e);
                    sleep(self.retry.max_delay).await;
                }
            }
        }
    }

    /// Fetch one batch starting at `offset`, enqueue it and return the next offset
    pub async fn poll_once(&self, offset: i64, queue: &UpdateQueue) -> Result<i64> {
        let updates = with_retry(&self.retry, "getUpdates", || {
            self.client.get_updates(offset, self.timeout)
        })
        .await?;

        let mut next = offset;
        for update in updates {
            next = next.max(update.update_id + 1);
            queue.submit(update).await?;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::models::PoolScope;
    use crate::quiz::QuizEngine;
    use crate::router::Router;
    use crate::store::MemoryStore;
    use crate::testing::{FakeTranslator, RecordingTransport};
    use crate::user_config::ConfigStore;
    use std::sync::Arc;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn dispatcher(transport: Arc<RecordingTransport>) -> Dispatcher {
        let store = Arc::new(MemoryStore::new());
        let translator = Arc::new(FakeTranslator::new());
        translator.respond("hello", "привет");
        let quiz = QuizEngine::new(store.clone(), ConfigStore::new(store.clone()), PoolScope::Global);
        let router = Router::new(store.clone(), translator, transport.clone(), quiz);
        Dispatcher::new(router, store, transport)
    }

    fn poller(server: &MockServer) -> Poller {
        let client =
            TelegramClient::new("test-token", &server.uri(), Duration::from_secs(5)).unwrap();
        Poller::new(client, Duration::from_secs(0))
            .with_retry_config(RetryConfig::new(2, Duration::from_millis(10)))
    }

    #[tokio::test]
    async fn test_poll_once_advances_offset_and_dispatches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottest-token/getUpdates"))
            .and(body_partial_json(serde_json::json!({ "offset": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 40,
                        "message": {
                            "message_id": 1,
                            "from": { "id": 8, "first_name": "A" },
                            "chat": { "id": 8, "type": "private" },
                            "text": "hello"
                        }
                    },
                    { "update_id": 41 }
                ]
            })))
            .mount(&server)
            .await;

        let transport = Arc::new(RecordingTransport::new());
        let (queue, pool) = dispatcher(transport.clone()).start(1);

        let next = poller(&server).poll_once(0, &queue).await.unwrap();
        assert_eq!(next, 42);

        drop(queue);
        pool.join().await;
        assert_eq!(transport.sent(), vec![(8, "привет".to_string())]);
    }

    #[tokio::test]
    async fn test_poll_once_empty_batch_keeps_offset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottest-token/getUpdates"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ok": true, "result": [] })),
            )
            .mount(&server)
            .await;

        let (queue, _pool) = dispatcher(Arc::new(RecordingTransport::new())).start(1);
        assert_eq!(poller(&server).poll_once(17, &queue).await.unwrap(), 17);
    }

    #[tokio::test]
    async fn test_poll_once_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottest-token/getUpdates"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let (queue, _pool) = dispatcher(Arc::new(RecordingTransport::new())).start(1);
        assert!(poller(&server).poll_once(0, &queue).await.is_err());
    }
}
