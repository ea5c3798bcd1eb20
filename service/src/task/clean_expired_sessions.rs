//! [`CleanExpiredSessions`] [`Task`].

use std::{convert::Infallible, time};

use common::operations::{By, Perform, Start};
use tokio::time::interval;

#[cfg(doc)]
use crate::domain::user::Session;
use crate::{domain::user::session, Service};

use super::Task;

/// Configuration for [`CleanExpiredSessions`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between expired [`Session`]s sweeps.
    pub interval: time::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: time::Duration::from_secs(10 * 60),
        }
    }
}

/// [`Task`] for removing expired [`Session`]s nobody presents anymore.
#[derive(Clone, Copy, Debug)]
pub struct CleanExpiredSessions<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<CleanExpiredSessions<Self>, Config>>> for Service<Db>
where
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<CleanExpiredSessions<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = CleanExpiredSessions {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await;
        }
    }
}

impl<Db> Task<Perform<()>> for CleanExpiredSessions<Service<Db>> {
    type Ok = usize;
    type Err = Infallible;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .service
            .sessions()
            .purge_expired(session::ExpirationDateTime::now()))
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::Perform;

    use super::{CleanExpiredSessions, Config};
    use crate::{domain::user, infra::Memory, Service, Task as _};

    #[tokio::test]
    async fn purges_expired_sessions() {
        let config = crate::Config {
            session_ttl: Duration::from_millis(10),
            ..crate::Config::default()
        };
        let (svc, _bg) = Service::new(config, Memory::default());
        let name = user::Name::new("alice").unwrap();
        let session = svc.sessions().create(name).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let task = CleanExpiredSessions {
            config: Config::default(),
            service: svc.clone(),
        };
        assert_eq!(task.execute(Perform(())).await.unwrap(), 1);
        assert!(svc.sessions().is_empty());
        assert!(svc.sessions().lookup(&session.token).is_none());
    }
}
