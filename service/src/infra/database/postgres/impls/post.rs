//! [`Post`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{post, Post},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Post>, post::Link>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Post>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Post>, post::Link>>,
    ) -> Result<Self::Ok, Self::Err> {
        let link = by.into_inner();

        const SQL: &str = "\
            SELECT p.id, p.link, p.title, p.summary, \
                   u.username AS author, \
                   p.content, p.updated_at \
            FROM posts p \
            JOIN users u ON p.author_id = u.id \
            WHERE p.link = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&link])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Post {
                id: row.get("id"),
                link: row.get("link"),
                title: row.get("title"),
                summary: row.get("summary"),
                author: row.get("author"),
                content: row.get("content"),
                updated_at: row.get("updated_at"),
            }))
    }
}
