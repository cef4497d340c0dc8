use super::DbPool;
use crate::errors::StorageError;
use diesel::SqliteConnection;
use log::error;
use std::any::Any;
use tokio::sync::{mpsc, oneshot};
use tokenlens_core::errors::{DatabaseError, Error, Result};

/// Pending jobs the writer may queue before `exec` callers wait for room.
const WRITE_QUEUE_CAPACITY: usize = 1024;

// A job runs against the writer's dedicated connection and returns a
// type-erased value so one channel can carry every job type.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type ErasedReply = Result<Box<dyn Any + Send + 'static>>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    #[allow(clippy::type_complexity)]
    tx: mpsc::Sender<(
        Job<Box<dyn Any + Send + 'static>>,
        oneshot::Sender<ErasedReply>,
    )>,
}

impl WriteHandle {
    /// Runs `job` inside an immediate transaction on the writer's connection.
    ///
    /// Fails with `DatabaseError::Internal` if the actor has stopped.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_stopped("writer actor is not accepting jobs"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_stopped("writer actor dropped the reply"))??;

        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| writer_stopped("writer actor returned an unexpected type"))
    }
}

fn writer_stopped(message: &str) -> Error {
    Error::Database(DatabaseError::Internal(message.to_string()))
}

/// Spawns a background task that owns one pooled connection and applies write
/// jobs serially. SQLite allows a single writer, so every mutation goes here.
///
/// Must be called from inside a Tokio runtime.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(
        Job<Box<dyn Any + Send + 'static>>,
        oneshot::Sender<ErasedReply>,
    )>(WRITE_QUEUE_CAPACITY);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer actor could not acquire a connection: {}", e);
                let message = e.to_string();
                // Fail queued and future jobs instead of leaving callers waiting.
                while let Some((_, reply_tx)) = rx.recv().await {
                    let _ = reply_tx.send(Err(Error::Database(
                        DatabaseError::ConnectionFailed(message.clone()),
                    )));
                }
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: ErasedReply = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // The requester may have timed out and dropped the receiver.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
