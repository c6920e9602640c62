//! [`Package`]-related read definitions.

use common::price;
use derive_more::{Deref, From, Into};

use crate::domain::{package::CostSection, Package};

/// [`Package`] as shown to public readers.
#[derive(Clone, Debug, Deref, From, Into)]
pub struct Display(Package);

impl Display {
    /// Returns the [`CostSection`] of this [`Package`], if it's visible.
    ///
    /// Disabled or empty [`CostSection`]s are never shown, while their
    /// contents are kept for editing.
    #[must_use]
    pub fn cost_section(&self) -> Option<&CostSection> {
        self.0
            .cost_section
            .is_visible()
            .then_some(&self.0.cost_section)
    }

    /// Returns the price of this [`Package`] per person, formatted for
    /// display.
    #[must_use]
    pub fn price_per_person(&self) -> price::Formatted {
        self.0.price.per_person()
    }

    /// Returns the [`Package`] being displayed.
    #[must_use]
    pub fn into_inner(self) -> Package {
        self.0
    }
}

pub mod list {
    //! [`Package`] list definitions.

    use crate::domain::package;
    #[cfg(doc)]
    use crate::domain::Package;

    /// Filter of a [`Package`]s list.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`package::Category`] to list [`Package`]s of.
        pub category: Option<package::Category>,

        /// [`package::Type`] to list [`Package`]s of.
        pub r#type: Option<package::Type>,

        /// Whether to list only featured (or only regular) [`Package`]s.
        pub featured: Option<bool>,
    }
}

#[cfg(test)]
mod spec {
    use common::Price;

    use crate::domain::{
        package::{self, Description, Document, Name, Slug},
        Package,
    };

    use super::Display;

    fn package() -> Package {
        Package {
            id: package::Id::new(),
            document: Document::new(
                Name::new("Goa Getaway").unwrap(),
                Slug::new("goa-getaway").unwrap(),
                Price::from(12_000),
                Description::new("Beach trip").unwrap(),
            ),
            created_at: package::CreationDateTime::now(),
            updated_at: package::ModificationDateTime::now(),
        }
    }

    #[test]
    fn hides_disabled_cost_section() {
        let mut pkg = package();
        let _ = pkg.document.cost_section.table.push_column("Item");
        let _ = pkg.document.cost_section.table.push_row();

        assert!(Display::from(pkg.clone()).cost_section().is_none());

        pkg.document.cost_section.enabled = true;
        assert!(Display::from(pkg).cost_section().is_some());
    }

    #[test]
    fn hides_empty_cost_section() {
        let mut pkg = package();
        pkg.document.cost_section.enabled = true;
        let _ = pkg.document.cost_section.table.push_column("Item");

        assert!(Display::from(pkg).cost_section().is_none());
    }

    #[test]
    fn formats_price() {
        assert_eq!(
            Display::from(package()).price_per_person().to_string(),
            "₹12,000/person",
        );
    }
}
