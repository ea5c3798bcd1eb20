//! [`Comment`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{comment, post, Comment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Vec<Comment>, post::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Comment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Comment>, post::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let post_id = by.into_inner();

        const SQL: &str = "\
            SELECT u.username, c.content, c.created_at \
            FROM comments c \
            JOIN users u ON c.user_id = u.id \
            WHERE c.post_id = $1::INT4 \
            ORDER BY c.created_at ASC, c.id ASC";
        Ok(self
            .query(SQL, &[&post_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Comment {
                author: row.get("username"),
                body: row.get("content"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

impl<C> Database<Insert<comment::Draft>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Comment;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<comment::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        let comment::Draft { post, author, body } = draft;

        const SQL: &str = "\
            WITH inserted AS (\
                INSERT INTO comments (post_id, user_id, content) \
                SELECT $1::INT4, u.id, $3::TEXT \
                FROM users u \
                WHERE u.username = $2::VARCHAR \
                RETURNING user_id, content, created_at\
            ) \
            SELECT u.username, i.content, i.created_at \
            FROM inserted i \
            JOIN users u ON i.user_id = u.id";
        let row = self
            .query_one(SQL, &[&post, &author, &body])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Comment {
            author: row.get("username"),
            body: row.get("content"),
            created_at: row.get("created_at"),
        })
    }
}
