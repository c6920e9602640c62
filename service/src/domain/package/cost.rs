//! [`CostSection`] definitions.

use std::collections::{BTreeMap, HashSet};

use derive_more::{Display, Error as StdError};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::Package;

/// Label a freshly added [`Column`] gets.
pub const NEW_COLUMN_LABEL: &str = "New Column";

/// Optional pricing breakdown of a [`Package`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct CostSection {
    /// Indicator whether this [`CostSection`] is shown publicly.
    ///
    /// Switching it off never clears the [`Table`].
    pub enabled: bool,

    /// Title shown above the [`Table`].
    pub title: String,

    /// Subtitle shown under the title.
    pub subtitle: String,

    /// Note shown under the [`Table`].
    pub note: String,

    /// [`Table`] itself.
    pub table: Table,
}

impl CostSection {
    /// Indicates whether this [`CostSection`] has anything to show publicly.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.enabled
            && !self.table.columns.is_empty()
            && !self.table.rows.is_empty()
    }
}

/// Table of dynamic shape: any number of [`Column`]s and [`Row`]s, with
/// [`Row`] cells keyed by [`column::Id`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Table {
    /// Ordered [`Column`]s of this [`Table`].
    pub columns: Vec<Column>,

    /// Ordered [`Row`]s of this [`Table`].
    pub rows: Vec<Row>,
}

impl Table {
    /// Appends a new [`Column`] with the provided `label`, backfilling an
    /// empty cell for it in every existing [`Row`].
    pub fn push_column(&mut self, label: impl Into<String>) -> column::Id {
        let id = column::Id::random();
        for row in &mut self.rows {
            drop(row.cells.insert(id.clone(), String::new()));
        }
        self.columns.push(Column {
            id: id.clone(),
            label: label.into(),
        });
        id
    }

    /// Renames the [`Column`] with the provided `id`.
    ///
    /// # Errors
    ///
    /// If there is no such [`Column`].
    pub fn rename_column(
        &mut self,
        id: &column::Id,
        label: impl Into<String>,
    ) -> Result<(), Error> {
        let col = self
            .columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| Error::UnknownColumn(id.clone()))?;
        col.label = label.into();
        Ok(())
    }

    /// Removes the [`Column`] with the provided `id` along with its cells in
    /// every [`Row`].
    ///
    /// # Errors
    ///
    /// If there is no such [`Column`].
    pub fn remove_column(&mut self, id: &column::Id) -> Result<Column, Error> {
        let pos = self
            .columns
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| Error::UnknownColumn(id.clone()))?;
        for row in &mut self.rows {
            drop(row.cells.remove(id));
        }
        Ok(self.columns.remove(pos))
    }

    /// Appends a new [`Row`] with an empty cell for every existing [`Column`].
    pub fn push_row(&mut self) -> row::Id {
        let id = row::Id::random();
        self.rows.push(Row {
            id: id.clone(),
            highlight: false,
            cells: self
                .columns
                .iter()
                .map(|c| (c.id.clone(), String::new()))
                .collect(),
        });
        id
    }

    /// Sets the `value` of the cell at the provided [`Row`] and [`Column`].
    ///
    /// # Errors
    ///
    /// If there is no such [`Row`] or [`Column`].
    pub fn set_cell(
        &mut self,
        row: &row::Id,
        column: &column::Id,
        value: impl Into<String>,
    ) -> Result<(), Error> {
        if !self.columns.iter().any(|c| &c.id == column) {
            return Err(Error::UnknownColumn(column.clone()));
        }
        let row = self.row_mut(row)?;
        drop(row.cells.insert(column.clone(), value.into()));
        Ok(())
    }

    /// Flips the [`Row::highlight`] of the [`Row`] with the provided `id`.
    ///
    /// # Errors
    ///
    /// If there is no such [`Row`].
    pub fn toggle_highlight(&mut self, id: &row::Id) -> Result<bool, Error> {
        let row = self.row_mut(id)?;
        row.highlight = !row.highlight;
        Ok(row.highlight)
    }

    /// Removes the [`Row`] with the provided `id`.
    ///
    /// # Errors
    ///
    /// If there is no such [`Row`].
    pub fn remove_row(&mut self, id: &row::Id) -> Result<Row, Error> {
        let pos = self
            .rows
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| Error::UnknownRow(id.clone()))?;
        Ok(self.rows.remove(pos))
    }

    /// Drops cells referring to [`Column`]s absent from this [`Table`].
    pub fn strip_orphans(&mut self) {
        let Self { columns, rows } = self;
        for row in rows {
            row.cells.retain(|id, _| columns.iter().any(|c| &c.id == id));
        }
    }

    /// Checks that no two [`Column`]s and no two [`Row`]s of this [`Table`]
    /// share an ID.
    ///
    /// # Errors
    ///
    /// With the first repeated ID met.
    pub fn check_unique_ids(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        if let Some(c) = self.columns.iter().find(|c| !seen.insert(&c.id)) {
            return Err(Error::DuplicateColumn(c.id.clone()));
        }
        let mut seen = HashSet::new();
        if let Some(r) = self.rows.iter().find(|r| !seen.insert(&r.id)) {
            return Err(Error::DuplicateRow(r.id.clone()));
        }
        Ok(())
    }

    /// Drops every [`Column`] and [`Row`] repeating the ID of a preceding one.
    pub fn dedupe(&mut self) {
        let mut seen = HashSet::new();
        self.columns.retain(|c| seen.insert(c.id.clone()));
        let mut seen = HashSet::new();
        self.rows.retain(|r| seen.insert(r.id.clone()));
    }

    /// Returns the cell value at the provided [`Row`] and [`Column`], if any.
    #[must_use]
    pub fn cell(&self, row: &row::Id, column: &column::Id) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| &r.id == row)
            .and_then(|r| r.cells.get(column))
            .map(String::as_str)
    }

    /// Returns the [`Row`] with the provided `id` for mutation.
    fn row_mut(&mut self, id: &row::Id) -> Result<&mut Row, Error> {
        self.rows
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::UnknownRow(id.clone()))
    }
}

/// Column of a [`Table`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Column {
    /// Opaque unique ID of this [`Column`].
    pub id: column::Id,

    /// Label of this [`Column`].
    #[serde(default)]
    pub label: String,
}

/// Row of a [`Table`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Row {
    /// Opaque unique ID of this [`Row`].
    pub id: row::Id,

    /// Indicator whether this [`Row`] is visually emphasized.
    #[serde(default)]
    pub highlight: bool,

    /// Cell values of this [`Row`] keyed by [`column::Id`].
    ///
    /// A missing key renders as an empty cell.
    #[serde(default)]
    pub cells: BTreeMap<column::Id, String>,
}

pub mod column {
    //! [`Column`] identity.
    //!
    //! [`Column`]: super::Column

    use derive_more::{AsRef, Display, From};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Opaque unique ID of a [`Column`].
    ///
    /// [`Column`]: super::Column
    #[derive(
        AsRef,
        Clone,
        Debug,
        Deserialize,
        Display,
        Eq,
        From,
        Hash,
        Ord,
        PartialEq,
        PartialOrd,
        Serialize,
    )]
    #[as_ref(str)]
    #[from(&str, String)]
    #[serde(transparent)]
    pub struct Id(String);

    impl Id {
        /// Generates a new random [`Id`].
        #[must_use]
        pub fn random() -> Self {
            Self(Uuid::new_v4().to_string())
        }
    }
}

pub mod row {
    //! [`Row`] identity.
    //!
    //! [`Row`]: super::Row

    use derive_more::{AsRef, Display, From};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Opaque unique ID of a [`Row`].
    ///
    /// [`Row`]: super::Row
    #[derive(
        AsRef,
        Clone,
        Debug,
        Deserialize,
        Display,
        Eq,
        From,
        Hash,
        Ord,
        PartialEq,
        PartialOrd,
        Serialize,
    )]
    #[as_ref(str)]
    #[from(&str, String)]
    #[serde(transparent)]
    pub struct Id(String);

    impl Id {
        /// Generates a new random [`Id`].
        #[must_use]
        pub fn random() -> Self {
            Self(Uuid::new_v4().to_string())
        }
    }
}

/// Error of addressing a [`Table`] part.
#[derive(Clone, Debug, Display, StdError, Eq, PartialEq)]
pub enum Error {
    /// Several [`Column`]s share the provided ID.
    #[display("`Column(id: {_0})` is not unique")]
    DuplicateColumn(#[error(not(source))] column::Id),

    /// Several [`Row`]s share the provided ID.
    #[display("`Row(id: {_0})` is not unique")]
    DuplicateRow(#[error(not(source))] row::Id),

    /// [`Column`] with the provided ID doesn't exist.
    #[display("`Column(id: {_0})` does not exist")]
    UnknownColumn(#[error(not(source))] column::Id),

    /// [`Row`] with the provided ID doesn't exist.
    #[display("`Row(id: {_0})` does not exist")]
    UnknownRow(#[error(not(source))] row::Id),
}

#[cfg(test)]
mod spec {
    use uuid::Uuid;

    use super::{column, row, CostSection, Error, Table, NEW_COLUMN_LABEL};

    fn table_with_rows(n: usize) -> Table {
        let mut table = Table::default();
        _ = table.push_column("Item");
        for _ in 0..n {
            _ = table.push_row();
        }
        table
    }

    fn assert_no_orphans(table: &Table) {
        for row in &table.rows {
            for key in row.cells.keys() {
                assert!(
                    table.columns.iter().any(|c| &c.id == key),
                    "orphan cell `{key}` in row `{}`",
                    row.id,
                );
            }
        }
    }

    #[test]
    fn new_column_is_backfilled() {
        let mut table = table_with_rows(3);

        let price = table.push_column("Price");

        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].label, "Price");
        for row in &table.rows {
            assert_eq!(row.cells.get(&price).map(String::as_str), Some(""));
        }
    }

    #[test]
    fn new_row_is_backfilled() {
        let mut table = Table::default();
        let a = table.push_column(NEW_COLUMN_LABEL);
        let b = table.push_column(NEW_COLUMN_LABEL);

        let row = table.push_row();

        assert_eq!(table.cell(&row, &a), Some(""));
        assert_eq!(table.cell(&row, &b), Some(""));
    }

    #[test]
    fn removing_column_strips_cells() {
        let mut table = table_with_rows(2);
        let price = table.push_column("Price");
        let first = table.rows[0].id.clone();
        table.set_cell(&first, &price, "12000").unwrap();

        let removed = table.remove_column(&price).unwrap();

        assert_eq!(removed.label, "Price");
        assert!(table.rows.iter().all(|r| !r.cells.contains_key(&price)));
        assert_no_orphans(&table);
    }

    #[test]
    fn addresses_unknown_parts() {
        let mut table = table_with_rows(1);
        let row = table.rows[0].id.clone();
        let ghost = column::Id::from("ghost");

        assert_eq!(
            table.set_cell(&row, &ghost, "x"),
            Err(Error::UnknownColumn(ghost.clone())),
        );
        assert!(table.remove_column(&ghost).is_err());
        assert!(table.rename_column(&ghost, "Ghost").is_err());
        assert!(table.toggle_highlight(&"nope".into()).is_err());
        assert!(table.remove_row(&"nope".into()).is_err());
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn toggles_highlight_and_removes_rows() {
        let mut table = table_with_rows(2);
        let row = table.rows[1].id.clone();

        assert_eq!(table.toggle_highlight(&row), Ok(true));
        assert_eq!(table.toggle_highlight(&row), Ok(false));

        _ = table.remove_row(&row).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(table.rows.iter().all(|r| r.id != row));
    }

    #[test]
    fn strips_orphans() {
        let mut table: Table = serde_json::from_str(
            r#"{
                "columns": [{"id": "c1", "label": "Item"}],
                "rows": [{"id": "r1", "cells": {"c1": "Hotel", "c9": "?"}}]
            }"#,
        )
        .unwrap();

        table.strip_orphans();

        assert_no_orphans(&table);
        assert_eq!(table.cell(&"r1".into(), &"c1".into()), Some("Hotel"));
        assert!(!table.rows[0].highlight);
    }

    #[test]
    fn detects_and_drops_repeated_ids() {
        let mut table: Table = serde_json::from_str(
            r#"{
                "columns": [
                    {"id": "c1", "label": "Item"},
                    {"id": "c1", "label": "Copy"}
                ],
                "rows": [
                    {"id": "r1", "cells": {"c1": "Hotel"}},
                    {"id": "r1", "cells": {"c1": "Flight"}},
                    {"id": "r2", "cells": {"c1": "Visa"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            table.check_unique_ids(),
            Err(Error::DuplicateColumn("c1".into())),
        );

        table.dedupe();

        assert_eq!(table.check_unique_ids(), Ok(()));
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].label, "Item");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(&"r1".into(), &"c1".into()), Some("Hotel"));
    }

    #[test]
    fn reports_repeated_row_ids() {
        let mut table = table_with_rows(1);
        let again = table.rows[0].clone();
        table.rows.push(again);

        assert_eq!(
            table.check_unique_ids(),
            Err(Error::DuplicateRow(table.rows[0].id.clone())),
        );
    }

    #[test]
    fn generates_uuid_ids() {
        let (a, b) = (column::Id::random(), column::Id::random());
        let row = row::Id::random();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_ref()).is_ok(), "{a}");
        assert!(Uuid::parse_str(row.as_ref()).is_ok(), "{row}");
    }

    #[test]
    fn visibility_requires_content() {
        let mut section = CostSection {
            enabled: true,
            ..CostSection::default()
        };
        assert!(!section.is_visible());

        section.table = table_with_rows(1);
        assert!(section.is_visible());

        section.enabled = false;
        assert!(!section.is_visible());
        assert_eq!(section.table.rows.len(), 1);
        assert_eq!(section.table.columns.len(), 1);
    }
}
