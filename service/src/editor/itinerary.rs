//! Itinerary editing of a [`Draft`].

use derive_more::Display;

use crate::domain::package::{itinerary, Day};

use super::{Draft, Error};

/// Itinerary [`Day`] of a [`Draft`] along with its drag identity.
#[derive(Clone, Debug)]
pub struct Entry {
    /// Stable [`Key`] of this [`Entry`].
    pub key: Key,

    /// [`Day`] itself.
    pub day: Day,
}

/// Stable identity of an [`Entry`] while it's being reordered.
///
/// Unlike [`Day::day`], it never changes when [`Entry`]s move around.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("day-{_0}")]
pub struct Key(u64);

/// Form a [`Day`] is added or edited through.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DayForm {
    /// Sequence number the [`Day`] is shown with.
    pub day: u16,

    /// Title of the [`Day`].
    pub title: String,

    /// Description of the [`Day`].
    pub description: String,

    /// Meals of the [`Day`].
    pub meals: String,

    /// Hotel of the [`Day`].
    pub hotel: String,
}

impl DayForm {
    /// Creates a new empty [`DayForm`] pre-filled with the provided sequence
    /// number.
    #[must_use]
    pub fn numbered(day: u16) -> Self {
        Self {
            day,
            ..Self::default()
        }
    }

    /// Converts this [`DayForm`] into a [`Day`].
    fn to_day(&self) -> Day {
        Day {
            day: self.day,
            title: self.title.clone(),
            description: self.description.clone(),
            meals: self.meals.clone(),
            hotel: self.hotel.clone(),
        }
    }
}

impl From<&Day> for DayForm {
    fn from(day: &Day) -> Self {
        Self {
            day: day.day,
            title: day.title.clone(),
            description: day.description.clone(),
            meals: day.meals.clone(),
            hotel: day.hotel.clone(),
        }
    }
}

impl Draft {
    /// Returns the itinerary [`Entry`]s of this [`Draft`] in their order.
    #[must_use]
    pub fn itinerary(&self) -> &[Entry] {
        &self.itinerary
    }

    /// Returns the current [`DayForm`].
    #[must_use]
    pub fn day_form(&self) -> &DayForm {
        &self.form
    }

    /// Returns the index of the [`Day`] being edited, if any.
    #[must_use]
    pub fn editing_day(&self) -> Option<usize> {
        self.editing
    }

    /// Returns the index of the [`Day`] waiting for deletion confirmation, if
    /// any.
    #[must_use]
    pub fn pending_delete(&self) -> Option<usize> {
        self.pending_delete
    }

    /// Sets the field of the [`DayForm`] with the provided `name`.
    ///
    /// # Errors
    ///
    /// If the [`DayForm`] has no such field.
    pub fn set_day_field(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), Error> {
        let field = match name {
            "title" => &mut self.form.title,
            "description" => &mut self.form.description,
            "meals" => &mut self.form.meals,
            "hotel" => &mut self.form.hotel,
            _ => return Err(Error::UnknownField(name.to_owned())),
        };
        *field = value.into();
        self.dirty = true;
        Ok(())
    }

    /// Appends a new [`Day`] out of the [`DayForm`] contents, and clears the
    /// [`DayForm`].
    pub fn add_day(&mut self) {
        let mut day = self.form.to_day();
        day.day = itinerary::next_number(self.itinerary.len());
        self.push_entry(day);
        self.dirty = true;
        self.reset_form();
    }

    /// Loads the [`Day`] at the provided `index` into the [`DayForm`] for
    /// editing.
    ///
    /// # Errors
    ///
    /// If there is no [`Day`] at the provided `index`.
    pub fn edit_day(&mut self, index: usize) -> Result<(), Error> {
        let entry =
            self.itinerary.get(index).ok_or(Error::UnknownDay(index))?;
        self.form = DayForm::from(&entry.day);
        self.editing = Some(index);
        Ok(())
    }

    /// Overwrites the [`Day`] being edited with the [`DayForm`] contents, and
    /// finishes editing.
    ///
    /// # Errors
    ///
    /// If no [`Day`] is being edited.
    pub fn update_day(&mut self) -> Result<(), Error> {
        let index = self.editing.ok_or(Error::NotEditing)?;
        let entry = self
            .itinerary
            .get_mut(index)
            .ok_or(Error::UnknownDay(index))?;
        entry.day = self.form.to_day();
        self.renumber();
        self.editing = None;
        self.dirty = true;
        self.reset_form();
        Ok(())
    }

    /// Finishes editing without touching the [`Day`] being edited.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.reset_form();
    }

    /// Marks the [`Day`] at the provided `index` for deletion, awaiting
    /// [`Draft::confirm_delete()`].
    ///
    /// # Errors
    ///
    /// If there is no [`Day`] at the provided `index`.
    pub fn request_delete(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.itinerary.len() {
            return Err(Error::UnknownDay(index));
        }
        self.pending_delete = Some(index);
        Ok(())
    }

    /// Removes the [`Day`] marked for deletion, renumbering the rest.
    ///
    /// # Errors
    ///
    /// If no [`Day`] is marked for deletion.
    pub fn confirm_delete(&mut self) -> Result<Day, Error> {
        let index = self.pending_delete.take().ok_or(Error::NothingPending)?;
        if index >= self.itinerary.len() {
            return Err(Error::UnknownDay(index));
        }
        let removed = self.itinerary.remove(index).day;
        self.editing = match self.editing {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        self.renumber();
        self.dirty = true;
        if self.editing.is_none() {
            self.reset_form();
        }
        Ok(removed)
    }

    /// Drops the deletion mark, if any.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Moves the [`Entry`] with the `from` [`Key`] to the position of the
    /// [`Entry`] with the `to` [`Key`], renumbering all of them.
    ///
    /// # Errors
    ///
    /// If there is no [`Entry`] with either [`Key`].
    pub fn move_day(&mut self, from: Key, to: Key) -> Result<(), Error> {
        let position = |key| {
            self.itinerary
                .iter()
                .position(|e| e.key == key)
                .ok_or(Error::UnknownEntry(key))
        };
        let (old, new) = (position(from)?, position(to)?);
        if old == new {
            return Ok(());
        }

        let entry = self.itinerary.remove(old);
        self.itinerary.insert(new, entry);
        // Indices shift, so the keys are the only thing left to trust.
        self.editing = None;
        self.pending_delete = None;
        self.renumber();
        self.dirty = true;
        self.reset_form();
        Ok(())
    }

    /// Appends the provided [`Day`] under a freshly issued [`Key`].
    pub(super) fn push_entry(&mut self, day: Day) {
        self.last_key += 1;
        self.itinerary.push(Entry {
            key: Key(self.last_key),
            day,
        });
    }

    /// Resets the [`DayForm`] to an empty one numbered after the last [`Day`].
    pub(super) fn reset_form(&mut self) {
        self.form = DayForm::numbered(itinerary::next_number(
            self.itinerary.len(),
        ));
    }

    /// Re-derives [`Day::day`] numbers from positions.
    fn renumber(&mut self) {
        itinerary::renumber(self.itinerary.iter_mut().map(|e| &mut e.day));
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{package::Day, Package},
        editor::{Draft, Error},
    };

    fn with_days(titles: &[&str]) -> Draft {
        let mut doc = Package::sample("goa-getaway").document;
        doc.itinerary = (1..)
            .zip(titles)
            .map(|(n, title)| Day {
                title: (*title).to_owned(),
                ..Day::numbered(n)
            })
            .collect();
        Draft::from(&doc)
    }

    fn numbers(draft: &Draft) -> Vec<u16> {
        draft.itinerary().iter().map(|e| e.day.day).collect()
    }

    fn titles(draft: &Draft) -> Vec<&str> {
        draft
            .itinerary()
            .iter()
            .map(|e| e.day.title.as_str())
            .collect()
    }

    #[test]
    fn adds_day_from_form() {
        let mut draft = with_days(&["Arrive"]);
        assert_eq!(draft.day_form().day, 2);

        draft.set_day_field("title", "Beach").unwrap();
        draft.set_day_field("hotel", "Taj").unwrap();
        draft.add_day();

        assert!(draft.has_unsaved_changes());
        assert_eq!(numbers(&draft), [1, 2]);
        assert_eq!(draft.itinerary()[1].day.hotel, "Taj");
        assert_eq!(draft.day_form().day, 3);
        assert_eq!(draft.day_form().title, "");
    }

    #[test]
    fn edits_one_day_at_a_time() {
        let mut draft = with_days(&["Arrive", "Beach"]);

        draft.edit_day(0).unwrap();
        assert_eq!(draft.day_form().title, "Arrive");
        assert_eq!(draft.editing_day(), Some(0));

        draft.edit_day(1).unwrap();
        draft.set_day_field("title", "Cruise").unwrap();
        draft.update_day().unwrap();

        assert_eq!(titles(&draft), ["Arrive", "Cruise"]);
        assert_eq!(numbers(&draft), [1, 2]);
        assert_eq!(draft.editing_day(), None);
        assert_eq!(draft.update_day(), Err(Error::NotEditing));
        assert_eq!(draft.edit_day(2), Err(Error::UnknownDay(2)));
    }

    #[test]
    fn cancels_edit() {
        let mut draft = with_days(&["Arrive"]);
        draft.edit_day(0).unwrap();
        draft.set_day_field("title", "Changed").unwrap();

        draft.cancel_edit();

        assert_eq!(titles(&draft), ["Arrive"]);
        assert_eq!(draft.day_form().day, 2);
        assert_eq!(draft.day_form().title, "");
    }

    #[test]
    fn deletes_in_two_steps_and_renumbers() {
        let mut draft = with_days(&["One", "Two", "Three"]);

        draft.request_delete(1).unwrap();
        assert_eq!(draft.pending_delete(), Some(1));
        assert!(!draft.has_unsaved_changes());

        let removed = draft.confirm_delete().unwrap();

        assert_eq!(removed.title, "Two");
        assert_eq!(titles(&draft), ["One", "Three"]);
        assert_eq!(numbers(&draft), [1, 2]);
        assert_eq!(draft.confirm_delete(), Err(Error::NothingPending));
    }

    #[test]
    fn cancels_delete() {
        let mut draft = with_days(&["One", "Two"]);

        draft.request_delete(0).unwrap();
        draft.cancel_delete();

        assert_eq!(draft.pending_delete(), None);
        assert_eq!(draft.confirm_delete(), Err(Error::NothingPending));
        assert_eq!(titles(&draft), ["One", "Two"]);
        assert_eq!(draft.request_delete(2), Err(Error::UnknownDay(2)));
    }

    #[test]
    fn reorders_by_keys() {
        let mut draft = with_days(&["One", "Two", "Three"]);
        let keys = draft
            .itinerary()
            .iter()
            .map(|e| e.key)
            .collect::<Vec<_>>();

        draft.move_day(keys[2], keys[0]).unwrap();

        assert_eq!(titles(&draft), ["Three", "One", "Two"]);
        assert_eq!(numbers(&draft), [1, 2, 3]);
        assert_eq!(draft.itinerary()[0].key, keys[2]);
        assert!(draft.has_unsaved_changes());
    }

    #[test]
    fn keeps_numbers_positional_after_any_mutation() {
        let mut draft = with_days(&["A", "B", "C", "D"]);
        let key = |d: &Draft, i: usize| d.itinerary()[i].key;

        draft.add_day();
        let (from, to) = (key(&draft, 4), key(&draft, 1));
        draft.move_day(from, to).unwrap();
        draft.request_delete(0).unwrap();
        drop(draft.confirm_delete().unwrap());
        let (from, to) = (key(&draft, 0), key(&draft, 3));
        draft.move_day(from, to).unwrap();

        for (i, entry) in draft.itinerary().iter().enumerate() {
            assert_eq!(usize::from(entry.day.day), i + 1);
        }
        assert_eq!(draft.to_document().unwrap().itinerary.len(), 4);
    }

    #[test]
    fn normalizes_descriptions_on_write() {
        let mut draft = with_days(&[]);
        draft
            .set_day_field("description", "  Land \n\n Check in ")
            .unwrap();
        draft.add_day();

        let doc = draft.to_document().unwrap();

        assert_eq!(doc.itinerary[0].description, "Land\nCheck in");
    }
}
