//! In-memory [`Database`] implementation.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error};
use tracerr::Traced;

use crate::{
    domain::{comment, post, thumbnail, user, Comment, Post, Thumbnail, User},
    infra::{database, Database},
};

/// In-memory [`Database`] counting every call made to it.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored entities.
    state: Arc<Mutex<State>>,

    /// Number of calls made per operation.
    calls: Arc<Counters>,

    /// Indicator whether every operation fails with [`Unavailable`].
    unavailable: Arc<AtomicBool>,
}

/// Entities stored in a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: Vec<User>,

    /// Stored [`Post`]s along with their creation moments.
    posts: Vec<(Post, post::CreationDateTime)>,

    /// Stored [`Comment`]s along with the [`post::Id`] they belong to.
    comments: Vec<(post::Id, Comment)>,
}

/// Atomic call counters of a [`Memory`] database.
#[derive(Debug, Default)]
struct Counters {
    select_user: AtomicUsize,
    select_post: AtomicUsize,
    select_comments: AtomicUsize,
    select_thumbnails: AtomicUsize,
    insert_comment: AtomicUsize,
}

/// Snapshot of the number of calls made to a [`Memory`] database.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Calls {
    /// [`User`] selections by [`user::Name`].
    pub select_user: usize,

    /// [`Post`] selections by [`post::Link`].
    pub select_post: usize,

    /// [`Comment`]s selections by [`post::Id`].
    pub select_comments: usize,

    /// [`Thumbnail`]s selections.
    pub select_thumbnails: usize,

    /// [`comment::Draft`] insertions.
    pub insert_comment: usize,
}

/// Error of a [`Memory`] database switched into an unavailable mode.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("in-memory database is unavailable")]
pub struct Unavailable;

impl Memory {
    /// Stores the provided [`User`].
    pub fn add_user(&self, user: User) {
        self.state().users.push(user);
    }

    /// Stores the provided [`Post`], assigning it a new [`post::Id`].
    ///
    /// The [`Post`] is considered created when it was last modified.
    pub fn add_post(&self, mut post: Post) -> post::Id {
        let mut state = self.state();
        let id = post::Id::from(
            i32::try_from(state.posts.len()).unwrap_or(i32::MAX - 1) + 1,
        );
        post.id = id;
        let created_at = post.updated_at.coerce();
        state.posts.push((post, created_at));
        id
    }

    /// Stores the provided [`Comment`] under the [`Post`] with the provided
    /// [`post::Id`].
    pub fn add_comment(&self, post: post::Id, comment: Comment) {
        self.state().comments.push((post, comment));
    }

    /// Returns the [`Comment`]s stored under the provided [`post::Id`].
    #[must_use]
    pub fn comments(&self, post: post::Id) -> Vec<Comment> {
        self.state()
            .comments
            .iter()
            .filter(|(id, _)| *id == post)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Switches every further operation to fail (or to succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of calls made so far.
    #[must_use]
    pub fn calls(&self) -> Calls {
        let c = &self.calls;
        Calls {
            select_user: c.select_user.load(Ordering::SeqCst),
            select_post: c.select_post.load(Ordering::SeqCst),
            select_comments: c.select_comments.load(Ordering::SeqCst),
            select_thumbnails: c.select_thumbnails.load(Ordering::SeqCst),
            insert_comment: c.insert_comment.load(Ordering::SeqCst),
        }
    }

    /// Locks the stored entities.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts a call with the provided `counter` and fails if this [`Memory`]
    /// is unavailable.
    fn call(
        &self,
        counter: impl FnOnce(&Counters) -> &AtomicUsize,
    ) -> Result<(), Traced<database::Error>> {
        _ = counter(&self.calls).fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(tracerr::new!(database::Error::from(Unavailable)));
        }
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Name>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.call(|c| &c.select_user)?;
        let name = by.into_inner();
        Ok(self.state().users.iter().find(|u| u.name == name).cloned())
    }
}

impl Database<Select<By<Option<Post>, post::Link>>> for Memory {
    type Ok = Option<Post>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Post>, post::Link>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.call(|c| &c.select_post)?;
        let link = by.into_inner();
        Ok(self
            .state()
            .posts
            .iter()
            .find(|(p, _)| p.link == link)
            .map(|(p, _)| p.clone()))
    }
}

impl Database<Select<By<Vec<Comment>, post::Id>>> for Memory {
    type Ok = Vec<Comment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Comment>, post::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.call(|c| &c.select_comments)?;
        let mut comments = self.comments(by.into_inner());
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }
}

impl Database<Select<By<Vec<Thumbnail>, thumbnail::Limit>>> for Memory {
    type Ok = Vec<Thumbnail>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Thumbnail>, thumbnail::Limit>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.call(|c| &c.select_thumbnails)?;
        let mut posts = self.state().posts.clone();
        let posts = match by.into_inner() {
            thumbnail::Limit::At(n) => {
                posts.sort_by(|(a, _), (b, _)| b.updated_at.cmp(&a.updated_at));
                posts.truncate(usize::try_from(n).unwrap_or(usize::MAX));
                posts
            }
            thumbnail::Limit::None => {
                posts.sort_by(|(_, a), (_, b)| b.cmp(a));
                posts
            }
        };
        Ok(posts
            .into_iter()
            .map(|(p, _)| Thumbnail {
                link: p.link,
                title: p.title,
                summary: p.summary,
                updated_at: p.updated_at,
            })
            .collect())
    }
}

impl Database<Insert<comment::Draft>> for Memory {
    type Ok = Comment;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<comment::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        self.call(|c| &c.insert_comment)?;
        let comment::Draft { post, author, body } = draft;
        let comment = Comment {
            author,
            body,
            created_at: comment::CreationDateTime::now(),
        };
        self.add_comment(post, comment.clone());
        Ok(comment)
    }
}
