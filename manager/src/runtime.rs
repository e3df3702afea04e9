use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_channel::{Receiver, Sender};
use log::{info, trace};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{events::NetworkEvents, NetworkManager};

/// Drive `manager` from a tokio task, calling
/// [`update`](NetworkManager::update) every `poll_interval`. The replication
/// tick still fires at the configured sync rate; `poll_interval` only bounds
/// how late it can be.
///
/// Must be called from within a tokio runtime.
pub fn spawn_network_loop(manager: NetworkManager, poll_interval: Duration) -> NetworkLoopHandle {
    let manager = Arc::new(Mutex::new(manager));
    let (shutdown_sender, mut shutdown_receiver) = oneshot::channel::<()>();
    let (event_sender, event_receiver) = async_channel::unbounded();

    let task_manager = manager.clone();
    let task = tokio::spawn(async move {
        let mut interval = time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_receiver => break,
                _ = interval.tick() => {
                    let events = lock(&task_manager).update(Instant::now().into_std());
                    forward_events(&event_sender, events);
                }
            }
        }
        info!("NetworkLoop: stopped");
    });

    NetworkLoopHandle {
        manager,
        events: event_receiver,
        shutdown: Some(shutdown_sender),
        task,
    }
}

fn forward_events(sender: &Sender<NetworkEvents>, events: NetworkEvents) {
    if events.is_empty() {
        return;
    }
    if sender.try_send(events).is_err() {
        trace!("NetworkLoop: nobody is listening for events");
    }
}

fn lock(manager: &Mutex<NetworkManager>) -> MutexGuard<'_, NetworkManager> {
    manager.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns a running network loop. Dropping the handle stops the loop too, but
/// only [`shutdown`](Self::shutdown) waits for it.
pub struct NetworkLoopHandle {
    manager: Arc<Mutex<NetworkManager>>,
    events: Receiver<NetworkEvents>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl NetworkLoopHandle {
    /// Run `f` with exclusive access to the manager, between two updates
    pub fn with_manager<R>(&self, f: impl FnOnce(&mut NetworkManager) -> R) -> R {
        f(&mut lock(&self.manager))
    }

    /// Every non-empty batch of events produced by the loop, in order
    pub fn events(&self) -> Receiver<NetworkEvents> {
        self.events.clone()
    }

    /// Cancel the loop timer and wait for the task to finish
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(error) = (&mut self.task).await {
            info!("NetworkLoop: task ended abnormally: {}", error);
        }
    }
}
