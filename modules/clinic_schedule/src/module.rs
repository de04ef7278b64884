use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::ClinicScheduleConfig;
use crate::contract::client::ClinicScheduleApi;
use crate::domain::repo::{AppointmentsRepository, SlotsRepository};
use crate::domain::service::Service;
use crate::gateways::local::ClinicScheduleLocalClient;
use crate::infra::events::LogEventPublisher;
use crate::infra::storage::memory::{InMemoryAppointmentsRepository, InMemorySlotsRepository};
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::{SeaOrmAppointmentsRepository, SeaOrmSlotsRepository};

/// Wired clinic_schedule module: service, local client and REST registration.
#[derive(Clone)]
pub struct ClinicSchedule {
    service: Arc<Service>,
}

impl ClinicSchedule {
    /// Build on top of a database connection. Migrations are not run here, see [`migrate`].
    pub fn with_database(db: DatabaseConnection, cfg: ClinicScheduleConfig) -> Self {
        info!("Initializing clinic_schedule module on database");
        Self::from_repositories(
            Arc::new(SeaOrmSlotsRepository::new(db.clone())),
            Arc::new(SeaOrmAppointmentsRepository::new(db)),
            cfg,
        )
    }

    /// Build on process-local storage; nothing survives a restart.
    pub fn in_memory(cfg: ClinicScheduleConfig) -> Self {
        info!("Initializing clinic_schedule module in memory");
        Self::from_repositories(
            Arc::new(InMemorySlotsRepository::new()),
            Arc::new(InMemoryAppointmentsRepository::new()),
            cfg,
        )
    }

    pub fn from_repositories(
        slots: Arc<dyn SlotsRepository>,
        appointments: Arc<dyn AppointmentsRepository>,
        cfg: ClinicScheduleConfig,
    ) -> Self {
        debug!(
            "Loaded clinic_schedule config: max_slots_per_batch={}, transition_policy={:?}",
            cfg.max_slots_per_batch, cfg.transition_policy
        );
        let service = Service::new(slots, appointments, Arc::new(LogEventPublisher), cfg.into());
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn ClinicScheduleApi> {
        Arc::new(ClinicScheduleLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering clinic_schedule REST routes");
        let router = routes::register_routes(router, self.service.clone())?;
        info!("Clinic schedule REST routes registered successfully");
        Ok(router)
    }
}

/// Run the module's database migrations.
pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("Running clinic_schedule database migrations");
    Migrator::up(db, None).await?;
    info!("Clinic schedule database migrations completed successfully");
    Ok(())
}
