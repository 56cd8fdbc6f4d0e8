use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202601120002_create_kids"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("kids"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("name")).string().not_null())
                    .col(ColumnDef::new(Alias::new("email")).string().unique_key())
                    .col(ColumnDef::new(Alias::new("parent_phone")).string().unique_key())
                    .col(ColumnDef::new(Alias::new("password_hash")).string())
                    .col(ColumnDef::new(Alias::new("avatar")).string())
                    .col(ColumnDef::new(Alias::new("gender")).string())
                    .col(ColumnDef::new(Alias::new("father_name")).string())
                    .col(ColumnDef::new(Alias::new("mother_name")).string())
                    .col(ColumnDef::new(Alias::new("date_of_birth")).timestamp())
                    .col(ColumnDef::new(Alias::new("is_verified")).boolean().not_null().default(false))
                    .col(ColumnDef::new(Alias::new("verification_code")).string())
                    .col(ColumnDef::new(Alias::new("verification_code_expires")).timestamp())
                    .col(ColumnDef::new(Alias::new("last_login")).timestamp())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("kids")).to_owned())
            .await
    }
}
