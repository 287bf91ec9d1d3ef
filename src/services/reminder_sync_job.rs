//! Job programado de sincronización de recordatorios
//!
//! Lanza la sincronización periódicamente hasta recibir la señal de apagado.
//! La misma señal cancela una ejecución en curso entre pasos.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::services::reminder_sync_service::ServiceReminderSyncService;

pub struct ReminderSyncJob {
    service: Arc<ServiceReminderSyncService>,
    interval: Duration,
    run_on_startup: bool,
}

impl ReminderSyncJob {
    pub fn new(service: Arc<ServiceReminderSyncService>, interval: Duration, run_on_startup: bool) -> Self {
        Self {
            service,
            interval,
            run_on_startup,
        }
    }

    /// Bucle principal; devuelve el número de ejecuciones realizadas
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if !self.run_on_startup {
            // El primer tick de un interval es inmediato
            ticker.tick().await;
        }

        info!(
            "⏰ Job de recordatorios iniciado (cada {}s)",
            self.interval.as_secs()
        );

        let cancel = shutdown.clone();
        let mut runs = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let result = self.service.sync(&cancel).await;
                    runs += 1;
                    if !result.success {
                        warn!(
                            "⚠️ Sincronización programada sin éxito: {}",
                            result.error_message.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("🛑 Job de recordatorios detenido tras {} ejecuciones", runs);
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryReminderRepository;
    use crate::services::sync_lease::LocalSyncLease;
    use crate::utils::clock::SystemClock;

    fn service() -> Arc<ServiceReminderSyncService> {
        Arc::new(ServiceReminderSyncService::new(
            Arc::new(InMemoryReminderRepository::new()),
            Arc::new(SystemClock),
            Arc::new(LocalSyncLease::new()),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_runs_on_each_tick_until_shutdown() {
        let (tx, rx) = watch::channel(false);
        let job = ReminderSyncJob::new(service(), Duration::from_secs(60), true);
        let handle = tokio::spawn(job.run(rx));

        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();

        // ticks en t=0, 60 y 120
        assert_eq!(handle.await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_can_skip_startup_run() {
        let (tx, rx) = watch::channel(false);
        let job = ReminderSyncJob::new(service(), Duration::from_secs(60), false);
        let handle = tokio::spawn(job.run(rx));

        tokio::time::sleep(Duration::from_secs(30)).await;
        tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), 0);
    }
}
