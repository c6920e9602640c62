//! Cost table editing of a [`Draft`].

use crate::domain::package::cost::{column, row, CostSection, NEW_COLUMN_LABEL};

use super::{Draft, Error};

impl Draft {
    /// Returns the [`CostSection`] of this [`Draft`].
    #[must_use]
    pub fn cost_section(&self) -> &CostSection {
        &self.cost_section
    }

    /// Switches the [`CostSection`] on or off, keeping its contents intact.
    ///
    /// Returns whether it's enabled now.
    pub fn toggle_cost_section(&mut self) -> bool {
        self.cost_section.enabled = !self.cost_section.enabled;
        self.dirty = true;
        self.cost_section.enabled
    }

    /// Appends a new column, backfilling an empty cell for it in every row.
    ///
    /// Adding a column enables the [`CostSection`].
    pub fn add_column(&mut self, label: Option<&str>) -> column::Id {
        let id = self
            .cost_section
            .table
            .push_column(label.unwrap_or(NEW_COLUMN_LABEL));
        self.cost_section.enabled = true;
        self.dirty = true;
        id
    }

    /// Renames the column with the provided `id`.
    ///
    /// # Errors
    ///
    /// If there is no such column.
    pub fn rename_column(
        &mut self,
        id: &column::Id,
        label: impl Into<String>,
    ) -> Result<(), Error> {
        self.cost_section.table.rename_column(id, label)?;
        self.dirty = true;
        Ok(())
    }

    /// Removes the column with the provided `id` along with its cells.
    ///
    /// # Errors
    ///
    /// If there is no such column.
    pub fn remove_column(&mut self, id: &column::Id) -> Result<(), Error> {
        drop(self.cost_section.table.remove_column(id)?);
        self.dirty = true;
        Ok(())
    }

    /// Appends a new row with an empty cell for every column.
    pub fn add_row(&mut self) -> row::Id {
        let id = self.cost_section.table.push_row();
        self.dirty = true;
        id
    }

    /// Sets the cell at the provided row and column.
    ///
    /// # Errors
    ///
    /// If there is no such row or column.
    pub fn set_cell(
        &mut self,
        row: &row::Id,
        column: &column::Id,
        value: impl Into<String>,
    ) -> Result<(), Error> {
        self.cost_section.table.set_cell(row, column, value)?;
        self.dirty = true;
        Ok(())
    }

    /// Flips the highlighting of the row with the provided `id`.
    ///
    /// Returns whether the row is highlighted now.
    ///
    /// # Errors
    ///
    /// If there is no such row.
    pub fn toggle_highlight(&mut self, id: &row::Id) -> Result<bool, Error> {
        let highlight = self.cost_section.table.toggle_highlight(id)?;
        self.dirty = true;
        Ok(highlight)
    }

    /// Removes the row with the provided `id`.
    ///
    /// # Errors
    ///
    /// If there is no such row.
    pub fn remove_row(&mut self, id: &row::Id) -> Result<(), Error> {
        drop(self.cost_section.table.remove_row(id)?);
        self.dirty = true;
        Ok(())
    }
}
