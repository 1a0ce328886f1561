use std::future::Future;

use tokio::task::JoinHandle;

use crate::game::types::RoomCode;

/// Spawns a room-scoped task. `tokio_unstable` builds name the task; other
/// builds run it inside a span carrying the task name and room code.
pub(crate) fn spawn_room_task<F, S>(
    name: S,
    room: &RoomCode,
    future: F,
) -> std::io::Result<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
    S: Into<String>,
{
    let task_name = format!("{}-{}", name.into(), room);
    #[cfg(tokio_unstable)]
    {
        tokio::task::Builder::new().name(&task_name).spawn(future)
    }
    #[cfg(not(tokio_unstable))]
    {
        use tracing::Instrument;
        let span = tracing::info_span!("task", task_name = %task_name, room = %room);
        Ok(tokio::spawn(future.instrument(span)))
    }
}
