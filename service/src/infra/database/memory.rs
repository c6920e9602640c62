//! In-memory [`Database`] used in tests.

use std::sync::{Arc, Mutex, MutexGuard};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use tracerr::Traced;

use crate::{
    domain::{package, user, Package, User},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] keeping [`Package`]s and [`User`]s in insertion
/// order.
///
/// Transactions aren't isolated: every write is visible immediately.
#[derive(Clone, Debug, Default)]
pub(crate) struct Memory {
    /// Stored [`Package`]s.
    packages: Arc<Mutex<Vec<Package>>>,

    /// Stored [`User`]s.
    users: Arc<Mutex<Vec<User>>>,
}

impl Memory {
    /// Creates a new [`Memory`] storing the provided [`Package`]s.
    pub(crate) fn with_packages(
        packages: impl IntoIterator<Item = Package>,
    ) -> Self {
        let this = Self::default();
        this.packages().extend(packages);
        this
    }

    /// Locks the stored [`Package`]s.
    pub(crate) fn packages(&self) -> MutexGuard<'_, Vec<Package>> {
        self.packages.lock().unwrap()
    }

    /// Locks the stored [`User`]s.
    pub(crate) fn users(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap()
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Package>, package::Id>>> for Memory {
    type Ok = Option<Package>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Package>, package::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.packages().iter().find(|p| p.id == id).cloned())
    }
}

impl Database<Select<By<Option<Package>, package::Slug>>> for Memory {
    type Ok = Option<Package>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Package>, package::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();
        Ok(self.packages().iter().find(|p| p.slug == slug).cloned())
    }
}

impl Database<Select<By<Vec<Package>, read::package::list::Filter>>>
    for Memory
{
    type Ok = Vec<Package>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Package>, read::package::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::package::list::Filter {
            category,
            r#type,
            featured,
        } = by.into_inner();
        let mut found = self
            .packages()
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| r#type.as_ref().map_or(true, |t| p.r#type == *t))
            .filter(|p| featured.map_or(true, |f| p.featured == f))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

impl Database<Insert<Package>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(pkg): Insert<Package>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(pkg)).await
    }
}

impl Database<Update<Package>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(pkg): Update<Package>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut packages = self.packages();
        if let Some(existing) = packages.iter_mut().find(|p| p.id == pkg.id) {
            *existing = pkg;
        } else {
            packages.push(pkg);
        }
        Ok(())
    }
}

impl Database<Delete<By<Package, package::Id>>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Package, package::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut packages = self.packages();
        let before = packages.len();
        packages.retain(|p| p.id != id);
        Ok(packages.len() < before)
    }
}

impl Database<Lock<By<Package, package::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Package, package::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.users().iter().find(|u| u.id == id).cloned())
    }
}

impl<'e> Database<Select<By<Option<User>, &'e user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .users()
            .iter()
            .find(|u| u.email.as_ref() == Some(email))
            .cloned())
    }
}

impl<'p> Database<Select<By<Option<User>, &'p user::Phone>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'p user::Phone>>,
    ) -> Result<Self::Ok, Self::Err> {
        let phone = by.into_inner();
        Ok(self
            .users()
            .iter()
            .find(|u| u.phone.as_ref() == Some(phone))
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut users = self.users();
        if let Some(existing) = users.iter_mut().find(|u| u.id == user.id) {
            *existing = user;
        } else {
            users.push(user);
        }
        Ok(())
    }
}

impl Database<Lock<By<User, user::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}
