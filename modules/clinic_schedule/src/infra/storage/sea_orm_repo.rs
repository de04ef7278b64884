//! SeaORM-backed repository implementations for the domain ports.
//!
//! Both structs are generic over `C: ConnectionTrait`, so you can construct
//! them with a `DatabaseConnection` **or** a transactional connection.

use anyhow::Context;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::contract::model::{Appointment, AppointmentQuery, SlotPatch, SlotQuery, TimeSlot};
use crate::domain::repo::{
    AppointmentChanges, AppointmentsRepository, NewAppointmentRecord, NewTimeSlot,
    SlotsRepository,
};
use crate::infra::storage::entity::{appointment, slot};
use crate::infra::storage::mapper::{
    appointment_to_contract, date_to_db, slot_to_contract, time_to_db,
};

/// SeaORM slot repository.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmSlotsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmSlotsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> SlotsRepository for SeaOrmSlotsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn create(&self, s: NewTimeSlot) -> anyhow::Result<TimeSlot> {
        let now = Utc::now();
        let m = slot::ActiveModel {
            id: Set(Uuid::new_v4()),
            doctor_id: Set(s.doctor_id),
            doctor_name: Set(s.doctor_name),
            date: Set(date_to_db(s.date)),
            start_time: Set(time_to_db(s.start_time)),
            end_time: Set(time_to_db(s.end_time)),
            duration: Set(i32::try_from(s.duration).context("duration out of range")?),
            is_available: Set(s.is_available),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let row = m.insert(&self.conn).await.context("slot insert failed")?;
        slot_to_contract(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<TimeSlot>> {
        let found = slot::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("slot find_by_id failed")?;
        found.map(slot_to_contract).transpose()
    }

    async fn update(&self, id: Uuid, patch: SlotPatch) -> anyhow::Result<Option<TimeSlot>> {
        let Some(current) = slot::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("slot lookup for update failed")?
        else {
            return Ok(None);
        };

        let mut m = current.into_active_model();
        if let Some(date) = patch.date {
            m.date = Set(date_to_db(date));
        }
        if let Some(start) = patch.start_time {
            m.start_time = Set(time_to_db(start));
        }
        if let Some(end) = patch.end_time {
            m.end_time = Set(time_to_db(end));
        }
        if let Some(duration) = patch.duration {
            m.duration = Set(i32::try_from(duration).context("duration out of range")?);
        }
        if let Some(is_available) = patch.is_available {
            m.is_available = Set(is_available);
        }
        m.updated_at = Set(Utc::now());

        let row = m.update(&self.conn).await.context("slot update failed")?;
        slot_to_contract(row).map(Some)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = slot::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("slot delete failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn find(&self, query: &SlotQuery) -> anyhow::Result<Vec<TimeSlot>> {
        let select = match query {
            SlotQuery::ByDoctor(doctor_id) => {
                slot::Entity::find().filter(slot::Column::DoctorId.eq(doctor_id.as_str()))
            }
            SlotQuery::ByDate(date) => {
                slot::Entity::find().filter(slot::Column::Date.eq(date_to_db(*date)))
            }
            SlotQuery::Available { date } => {
                let mut select = slot::Entity::find().filter(slot::Column::IsAvailable.eq(true));
                if let Some(date) = date {
                    select = select.filter(slot::Column::Date.eq(date_to_db(*date)));
                }
                select
            }
        };
        let rows = select
            .all(&self.conn)
            .await
            .context("slot find failed")?;
        rows.into_iter().map(slot_to_contract).collect()
    }
}

/// SeaORM appointment repository.
pub struct SeaOrmAppointmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmAppointmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> AppointmentsRepository for SeaOrmAppointmentsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn create(&self, a: NewAppointmentRecord) -> anyhow::Result<Appointment> {
        let now = Utc::now();
        let m = appointment::ActiveModel {
            id: Set(Uuid::new_v4()),
            slot_id: Set(a.slot_id),
            patient_name: Set(a.patient_name),
            patient_phone: Set(a.patient_phone),
            patient_email: Set(a.patient_email),
            date: Set(date_to_db(a.date)),
            start_time: Set(time_to_db(a.start_time)),
            end_time: Set(time_to_db(a.end_time)),
            doctor_id: Set(a.doctor_id),
            doctor_name: Set(a.doctor_name),
            status: Set(a.status.as_str().to_string()),
            notes: Set(a.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let row = m
            .insert(&self.conn)
            .await
            .context("appointment insert failed")?;
        appointment_to_contract(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        let found = appointment::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("appointment find_by_id failed")?;
        found.map(appointment_to_contract).transpose()
    }

    async fn update(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> anyhow::Result<Option<Appointment>> {
        let Some(current) = appointment::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("appointment lookup for update failed")?
        else {
            return Ok(None);
        };

        let mut m = current.into_active_model();
        if let Some(name) = changes.patient_name {
            m.patient_name = Set(name);
        }
        if let Some(phone) = changes.patient_phone {
            m.patient_phone = Set(phone);
        }
        if let Some(email) = changes.patient_email {
            m.patient_email = Set(Some(email));
        }
        if let Some(notes) = changes.notes {
            m.notes = Set(Some(notes));
        }
        if let Some(status) = changes.status {
            m.status = Set(status.as_str().to_string());
        }
        m.updated_at = Set(Utc::now());

        let row = m
            .update(&self.conn)
            .await
            .context("appointment update failed")?;
        appointment_to_contract(row).map(Some)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = appointment::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("appointment delete failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn find(&self, query: &AppointmentQuery) -> anyhow::Result<Vec<Appointment>> {
        use appointment::Column;

        let select = appointment::Entity::find();
        let select = match query {
            AppointmentQuery::All => select,
            AppointmentQuery::ByDoctor(doctor_id) => {
                select.filter(Column::DoctorId.eq(doctor_id.as_str()))
            }
            AppointmentQuery::ByDate(date) => select.filter(Column::Date.eq(date_to_db(*date))),
            AppointmentQuery::ByStatus(status) => select.filter(Column::Status.eq(status.as_str())),
            AppointmentQuery::BySlot(slot_id) => select.filter(Column::SlotId.eq(*slot_id)),
        };
        let rows = select
            .all(&self.conn)
            .await
            .context("appointment find failed")?;
        rows.into_iter().map(appointment_to_contract).collect()
    }
}
