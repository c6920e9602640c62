//! [`Package`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::{Json, ToSql};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{package, Package},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`Package`] out of the provided `packages` table [`Row`].
fn from_row(row: &Row) -> Package {
    let Json(record) = row.get::<_, Json<package::Record>>("document");
    Package {
        id: row.get("id"),
        document: record.into_document(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<package::Id, Package>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[package::Id]>,
{
    type Ok = HashMap<package::Id, Package>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<package::Id, Package>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[package::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, document, created_at, updated_at \
            FROM packages \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let pkg = from_row(row);
                (pkg.id, pkg)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Package>, package::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<package::Id, Package>, [package::Id; 1]>>,
        Ok = HashMap<package::Id, Package>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Package>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Package>, package::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Package>, package::Slug>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Package>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Package>, package::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let slug: package::Slug = by.into_inner();

        const SQL: &str = "\
            SELECT id, document, created_at, updated_at \
            FROM packages \
            WHERE slug = $1::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&slug])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Package>, read::package::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
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

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let category_idx = category.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });
        let type_idx = r#type.as_ref().map(|t| {
            ps.push(t);
            ps.len()
        });
        let featured_idx = featured.as_ref().map(|f| {
            ps.push(f);
            ps.len()
        });

        let sql = format!(
            "SELECT id, document, created_at, updated_at \
             FROM packages \
             WHERE true \
                   {category_filtering} \
                   {type_filtering} \
                   {featured_filtering} \
             ORDER BY created_at DESC, id DESC",
            category_filtering =
                category_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND category = ${idx}::INT2"))
                }),
            type_filtering = type_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND type = ${idx}::VARCHAR"))
            }),
            featured_filtering =
                featured_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND featured = ${idx}::BOOLEAN"))
                }),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Package>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Package>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(pkg): Insert<Package>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(pkg)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Package>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(pkg): Update<Package>,
    ) -> Result<Self::Ok, Self::Err> {
        let Package {
            id,
            document,
            created_at,
            updated_at,
        } = pkg;
        let record = Json(package::Record::from(&document));

        const SQL: &str = "\
            INSERT INTO packages (\
                id, slug, category, type, featured, \
                document, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::INT2, $4::VARCHAR, $5::BOOLEAN, \
                $6::JSONB, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET slug = EXCLUDED.slug, \
                category = EXCLUDED.category, \
                type = EXCLUDED.type, \
                featured = EXCLUDED.featured, \
                document = EXCLUDED.document, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &document.slug,
                &document.category,
                &document.r#type,
                &document.featured,
                &record,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Package, package::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Package, package::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: package::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM packages \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|deleted| deleted > 0)
    }
}

impl<C> Database<Lock<By<Package, package::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Package, package::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: package::Id = by.into_inner();

        // Touching the existing row holds its lock until the transaction ends.
        const SQL: &str = "\
            INSERT INTO packages_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
