//! [`Thumbnail`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{thumbnail, Thumbnail},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Vec<Thumbnail>, thumbnail::Limit>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Thumbnail>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Thumbnail>, thumbnail::Limit>>,
    ) -> Result<Self::Ok, Self::Err> {
        let rows = match by.into_inner() {
            thumbnail::Limit::At(n) => {
                let limit = i64::from(n);

                const SQL: &str = "\
                    SELECT link, title, summary, updated_at \
                    FROM posts \
                    ORDER BY updated_at DESC \
                    LIMIT $1::INT8";
                self.query(SQL, &[&limit]).await
            }
            thumbnail::Limit::None => {
                const SQL: &str = "\
                    SELECT link, title, summary, updated_at \
                    FROM posts \
                    ORDER BY created_at DESC";
                self.query(SQL, &[]).await
            }
        }
        .map_err(tracerr::wrap!())?;

        Ok(rows
            .into_iter()
            .map(|row| Thumbnail {
                link: row.get("link"),
                title: row.get("title"),
                summary: row.get("summary"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }
}
