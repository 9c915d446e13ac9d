use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_items_table::Migration),
            Box::new(m20240301_000002_create_invoices_table::Migration),
            Box::new(m20240301_000003_create_invoice_items_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::Category).string().not_null())
                        .col(ColumnDef::new(Items::Price).decimal().not_null().default(0))
                        .col(ColumnDef::new(Items::Description).string().null())
                        .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp().null())
                        .col(ColumnDef::new(Items::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_category")
                        .table(Items::Table)
                        .col(Items::Category)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Items {
        Table,
        Id,
        Name,
        Category,
        Price,
        Description,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240301_000002_create_invoices_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_invoices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Invoices::InvoiceNumber).string().not_null())
                        .col(ColumnDef::new(Invoices::CustomerName).string().not_null())
                        .col(ColumnDef::new(Invoices::CustomerPhone).string().null())
                        .col(ColumnDef::new(Invoices::Date).timestamp().not_null())
                        .col(
                            ColumnDef::new(Invoices::Total)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Invoices::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Invoices::UpdatedAt).timestamp().null())
                        .col(ColumnDef::new(Invoices::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // invoice_number uniqueness is a store-level invariant
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_invoice_number")
                        .table(Invoices::Table)
                        .col(Invoices::InvoiceNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_date")
                        .table(Invoices::Table)
                        .col(Invoices::Date)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Invoices {
        Table,
        Id,
        InvoiceNumber,
        CustomerName,
        CustomerPhone,
        Date,
        Total,
        Version,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240301_000003_create_invoice_items_table {

    use sea_orm_migration::prelude::*;

    use super::m20240301_000001_create_items_table::Items;
    use super::m20240301_000002_create_invoices_table::Invoices;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_invoice_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InvoiceItems::InvoiceId).integer().not_null())
                        .col(ColumnDef::new(InvoiceItems::ItemId).integer().not_null())
                        .col(ColumnDef::new(InvoiceItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::UpdatedAt).timestamp().null())
                        .col(ColumnDef::new(InvoiceItems::DeletedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_invoice_id")
                                .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_item_id")
                                .from(InvoiceItems::Table, InvoiceItems::ItemId)
                                .to(Items::Table, Items::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_items_invoice_id")
                        .table(InvoiceItems::Table)
                        .col(InvoiceItems::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_items_item_id")
                        .table(InvoiceItems::Table)
                        .col(InvoiceItems::ItemId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InvoiceItems {
        Table,
        Id,
        InvoiceId,
        ItemId,
        Quantity,
        Price,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}
