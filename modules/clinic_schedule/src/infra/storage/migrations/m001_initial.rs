use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TimeSlots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TimeSlots::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TimeSlots::DoctorId).string().not_null())
                    .col(ColumnDef::new(TimeSlots::DoctorName).string().not_null())
                    .col(ColumnDef::new(TimeSlots::Date).string_len(10).not_null())
                    .col(ColumnDef::new(TimeSlots::StartTime).string_len(5).not_null())
                    .col(ColumnDef::new(TimeSlots::EndTime).string_len(5).not_null())
                    .col(ColumnDef::new(TimeSlots::Duration).integer().not_null())
                    .col(
                        ColumnDef::new(TimeSlots::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimeSlots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_slots_doctor_date")
                    .table(TimeSlots::Table)
                    .col(TimeSlots::DoctorId)
                    .col(TimeSlots::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::SlotId).uuid().not_null())
                    .col(ColumnDef::new(Appointments::PatientName).string().not_null())
                    .col(ColumnDef::new(Appointments::PatientPhone).string().not_null())
                    .col(ColumnDef::new(Appointments::PatientEmail).string().null())
                    .col(ColumnDef::new(Appointments::Date).string_len(10).not_null())
                    .col(ColumnDef::new(Appointments::StartTime).string_len(5).not_null())
                    .col(ColumnDef::new(Appointments::EndTime).string_len(5).not_null())
                    .col(ColumnDef::new(Appointments::DoctorId).string().not_null())
                    .col(ColumnDef::new(Appointments::DoctorName).string().not_null())
                    .col(ColumnDef::new(Appointments::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Appointments::Notes).text().null())
                    .col(
                        ColumnDef::new(Appointments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_slot")
                    .table(Appointments::Table)
                    .col(Appointments::SlotId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_doctor_date")
                    .table(Appointments::Table)
                    .col(Appointments::DoctorId)
                    .col(Appointments::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TimeSlots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TimeSlots {
    Table,
    Id,
    DoctorId,
    DoctorName,
    Date,
    StartTime,
    EndTime,
    Duration,
    IsAvailable,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
    SlotId,
    PatientName,
    PatientPhone,
    PatientEmail,
    Date,
    StartTime,
    EndTime,
    DoctorId,
    DoctorName,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}
