use crate::db::StoreError;
use crate::entities::{episodes, prelude::*, shows};
use crate::models::{Show, ShowStatus};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

pub struct ShowRepository<'a> {
    conn: &'a DatabaseTransaction,
}

impl<'a> ShowRepository<'a> {
    #[must_use]
    pub const fn new(conn: &'a DatabaseTransaction) -> Self {
        Self { conn }
    }

    pub(crate) fn map_model(model: shows::Model) -> Show {
        Show {
            id: Some(model.id),
            name: model.name,
            url: model.url,
            updated: model
                .updated
                .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.naive_utc()),
            status: ShowStatus::from_i32(model.status),
            enabled: model.enabled,
        }
    }

    /// Updates the row matching `show.id`, or inserts a new one.
    pub async fn save(&self, show: &Show) -> Result<Show, StoreError> {
        let mut model = shows::ActiveModel {
            id: NotSet,
            name: Set(show.name.clone()),
            url: Set(show.url.clone()),
            updated: Set(Some(show.updated)),
            enabled: Set(show.enabled),
            status: Set(show.status.as_i32()),
        };

        if let Some(id) = show.id {
            model.id = Set(id);
            if Shows::find_by_id(id).one(self.conn).await?.is_some() {
                let saved = model
                    .update(self.conn)
                    .await
                    .map_err(|e| StoreError::from_show_write(e, &show.url))?;
                return Ok(Self::map_model(saved));
            }
        }

        let saved = model
            .insert(self.conn)
            .await
            .map_err(|e| StoreError::from_show_write(e, &show.url))?;
        Ok(Self::map_model(saved))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Show>, DbErr> {
        let model = Shows::find_by_id(id).one(self.conn).await?;
        Ok(model.map(Self::map_model))
    }

    pub async fn get_by_url(&self, url: &str) -> Result<Option<Show>, DbErr> {
        let model = Shows::find()
            .filter(shows::Column::Url.eq(url))
            .one(self.conn)
            .await?;
        Ok(model.map(Self::map_model))
    }

    pub async fn list(&self) -> Result<Vec<Show>, DbErr> {
        let rows = Shows::find()
            .order_by_asc(shows::Column::Id)
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn list_enabled(&self) -> Result<Vec<Show>, DbErr> {
        let rows = Shows::find()
            .filter(shows::Column::Enabled.eq(true))
            .order_by_asc(shows::Column::Id)
            .all(self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Deletes the show and its episodes. Returns `false` when no such show exists.
    pub async fn remove(&self, id: i32) -> Result<bool, DbErr> {
        Episodes::delete_many()
            .filter(episodes::Column::ShowId.eq(id))
            .exec(self.conn)
            .await?;

        let result = Shows::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
