use super::show::ShowRepository;
use crate::entities::{episodes, prelude::*, shows};
use crate::models::Episode;
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Repository for episode rows
pub struct EpisodeRepository<'a> {
    conn: &'a DatabaseTransaction,
}

impl<'a> EpisodeRepository<'a> {
    #[must_use]
    pub const fn new(conn: &'a DatabaseTransaction) -> Self {
        Self { conn }
    }

    fn map_model(model: episodes::Model, show: Option<shows::Model>) -> Episode {
        Episode {
            show_id: Some(model.show_id),
            title: model.title,
            season: model.season,
            episode: model.num,
            airdate: model.airdate,
            prodnum: model.prodnum,
            total: model.totalnum,
            notified: model.notified,
            show: show.map(ShowRepository::map_model),
        }
    }

    /// Inserts or overwrites the row keyed by `(show_id, season, episode)`.
    ///
    /// A stored `notified` date survives when the incoming episode carries none.
    pub async fn upsert(&self, show_id: i32, episode: &Episode) -> Result<(), DbErr> {
        let model = episodes::ActiveModel {
            show_id: Set(show_id),
            season: Set(episode.season),
            num: Set(episode.episode),
            airdate: Set(episode.airdate),
            title: Set(episode.title.clone()),
            totalnum: Set(episode.total),
            prodnum: Set(episode.prodnum.clone()),
            notified: Set(episode.notified),
        };

        Episodes::insert(model)
            .on_conflict(
                OnConflict::columns([
                    episodes::Column::ShowId,
                    episodes::Column::Season,
                    episodes::Column::Num,
                ])
                .update_columns([
                    episodes::Column::Airdate,
                    episodes::Column::Title,
                    episodes::Column::Totalnum,
                    episodes::Column::Prodnum,
                ])
                .value(
                    episodes::Column::Notified,
                    Expr::cust("COALESCE(excluded.notified, episodes.notified)"),
                )
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        Ok(())
    }

    /// Episodes airing within `[start, end]`, earliest first.
    pub async fn between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Episode>, DbErr> {
        let rows = Episodes::find()
            .find_also_related(Shows)
            .filter(episodes::Column::Airdate.gte(start))
            .filter(episodes::Column::Airdate.lte(end))
            .order_by_asc(episodes::Column::Airdate)
            .order_by_asc(episodes::Column::ShowId)
            .order_by_asc(episodes::Column::Season)
            .order_by_asc(episodes::Column::Num)
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(ep, show)| Self::map_model(ep, show))
            .collect())
    }

    pub async fn search(&self, text: &str) -> Result<Vec<Episode>, DbErr> {
        let rows = Episodes::find()
            .find_also_related(Shows)
            .filter(
                Condition::any()
                    .add(episodes::Column::Title.contains(text))
                    .add(shows::Column::Name.contains(text)),
            )
            .order_by_asc(episodes::Column::Airdate)
            .order_by_asc(episodes::Column::ShowId)
            .order_by_asc(episodes::Column::Season)
            .order_by_asc(episodes::Column::Num)
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(ep, show)| Self::map_model(ep, show))
            .collect())
    }

    pub async fn for_show(&self, show_id: i32) -> Result<Vec<Episode>, DbErr> {
        let rows = Episodes::find()
            .find_also_related(Shows)
            .filter(episodes::Column::ShowId.eq(show_id))
            .order_by_asc(episodes::Column::Season)
            .order_by_asc(episodes::Column::Num)
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(ep, show)| Self::map_model(ep, show))
            .collect())
    }

    /// Deletes episodes airing strictly before `date`, optionally for one show only.
    pub async fn remove_before(&self, date: NaiveDate, show_id: Option<i32>) -> Result<u64, DbErr> {
        let mut query = Episodes::delete_many().filter(episodes::Column::Airdate.lt(date));
        if let Some(id) = show_id {
            query = query.filter(episodes::Column::ShowId.eq(id));
        }
        Ok(query.exec(self.conn).await?.rows_affected)
    }

    pub async fn clear(&self) -> Result<u64, DbErr> {
        Ok(Episodes::delete_many().exec(self.conn).await?.rows_affected)
    }
}
