use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "codes")]
/// Database row model for a redemption code.
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub issuer: i64,
    pub duration_days: i64,
    pub kind: String,
    pub consumed_by: Option<i64>,
    pub consumed_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
