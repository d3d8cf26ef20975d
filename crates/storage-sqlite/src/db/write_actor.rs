use super::DbPool;
use crate::errors::StorageError;
use diesel::SqliteConnection;
use log::{debug, error};
use savings_ledger_core::errors::{DatabaseError, Error, Result};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

// A job receives the writer's connection and returns a core Result, which is
// what repository callers expect.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type ErasedReply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(ErasedJob, ErasedReply)>,
}

fn writer_gone(detail: &str) -> Error {
    Error::Database(DatabaseError::Internal(format!("writer actor {}", detail)))
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection.
    ///
    /// The job runs inside an immediate transaction: either all of its
    /// statements commit or none do.
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
            .map_err(|_| writer_gone("stopped"))?;

        ret_rx
            .await
            .map_err(|_| writer_gone("dropped the reply"))?
            .and_then(|boxed: Box<dyn Any + Send + 'static>| {
                boxed
                    .downcast::<T>()
                    .map(|value| *value)
                    .map_err(|_| writer_gone("returned an unexpected type"))
            })
    }
}

/// Spawns a background Tokio task that acts as the single writer to the database.
/// The actor owns one pooled connection and processes write jobs serially.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(ErasedJob, ErasedReply)>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                // Dropping the receiver makes every later `exec` fail.
                error!("Writer actor could not acquire a connection: {}", e);
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // The requester may have gone away.
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor stopped");
    });

    WriteHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};
    use diesel::RunQueryDsl;
    use savings_ledger_core::goals::GoalError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_failed_job_rolls_back() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("writer.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        let result: Result<()> = writer
            .exec(|conn| {
                diesel::sql_query(
                    "INSERT INTO savings_goals (id, goal_type, name, target_amount, current_amount, \
                     status, rollover_enabled, start_month, created_at, updated_at) \
                     VALUES ('g1', 'event', 'Bike', '100', '0', 'active', 0, '2026-01', \
                     datetime('now'), datetime('now'))",
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Err(GoalError::GoalNotFound("g2".to_string()).into())
            })
            .await;

        assert!(matches!(result, Err(Error::Goal(GoalError::GoalNotFound(_)))));

        let count: i64 = writer
            .exec(|conn| {
                use crate::schema::savings_goals::dsl::*;
                use diesel::prelude::*;
                Ok(savings_goals
                    .count()
                    .get_result(conn)
                    .map_err(StorageError::from)?)
            })
            .await
            .expect("count");
        assert_eq!(count, 0);
    }
}
