//! [`Draft`] of a [`Document`] being edited.

use std::str::FromStr as _;

use common::{Price, Rating};
use derive_more::{Display, Error as StdError};

use crate::domain::package::{
    self, cost::CostSection, itinerary, text, Day, Document,
};

use super::{itinerary::DayForm, Error};

/// Locally editable copy of a [`Document`].
///
/// Values are kept the way they are typed in, and validated only when
/// converted back with [`Draft::to_document()`]. Every mutation marks this
/// [`Draft`] as having unsaved changes.
#[derive(Clone, Debug)]
pub struct Draft {
    /// Name of the package.
    pub(super) name: String,

    /// Slug of the package.
    pub(super) slug: String,

    /// Category of the package.
    pub(super) category: package::Category,

    /// Type of the package within its category.
    pub(super) r#type: String,

    /// Number of days of the trip.
    pub(super) days: i64,

    /// Number of nights of the trip.
    pub(super) nights: i64,

    /// Price of the trip, as typed.
    pub(super) price: String,

    /// Description of the package.
    pub(super) description: String,

    /// URLs of the cover images.
    pub(super) images: Vec<String>,

    /// URLs of the gallery images.
    pub(super) gallery_images: Vec<String>,

    /// Editable [`TextBlock`]s, in [`TextBlock::ALL`] order.
    pub(super) text_blocks: [String; 4],

    /// Itinerary [`Entry`]s in their order.
    ///
    /// [`Entry`]: super::itinerary::Entry
    pub(super) itinerary: Vec<super::itinerary::Entry>,

    /// Last issued [`Entry`] key.
    ///
    /// [`Entry`]: super::itinerary::Entry
    pub(super) last_key: u64,

    /// [`DayForm`] used for adding and editing [`Day`]s.
    pub(super) form: DayForm,

    /// Index of the [`Day`] loaded into the [`DayForm`] for editing.
    pub(super) editing: Option<usize>,

    /// Index of the [`Day`] waiting for deletion confirmation.
    pub(super) pending_delete: Option<usize>,

    /// [`CostSection`] of the package.
    pub(super) cost_section: CostSection,

    /// Displayed rating.
    pub(super) rating: f64,

    /// Displayed number of reviews.
    pub(super) reviews_count: i64,

    /// Indicator whether the package is promoted.
    pub(super) featured: bool,

    /// Indicator whether this [`Draft`] differs from what it was loaded from.
    pub(super) dirty: bool,
}

impl Draft {
    /// Indicates whether this [`Draft`] has changes not written yet.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Sets the field with the provided `name` to the provided `value`.
    ///
    /// Nested fields are addressed with dots (`duration.days`,
    /// `costSection.title`), and numeric and boolean values are parsed from
    /// the provided text.
    ///
    /// # Errors
    ///
    /// If there is no such field, or the `value` cannot be parsed for it.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let invalid = || Error::InvalidValue {
            field: name.to_owned(),
            value: value.to_owned(),
        };

        match name {
            "name" => self.name = value.to_owned(),
            "slug" => self.slug = value.to_owned(),
            "type" => self.r#type = value.to_owned(),
            "description" => self.description = value.to_owned(),
            "price" => self.price = value.to_owned(),
            "category" => {
                self.category = value.parse().map_err(|_| invalid())?;
            }
            "duration.days" => {
                self.days = value.trim().parse().map_err(|_| invalid())?;
            }
            "duration.nights" => {
                self.nights = value.trim().parse().map_err(|_| invalid())?;
            }
            "rating" => {
                self.rating = value.trim().parse().map_err(|_| invalid())?;
            }
            "reviewsCount" => {
                self.reviews_count =
                    value.trim().parse().map_err(|_| invalid())?;
            }
            "featured" => {
                self.featured = value.trim().parse().map_err(|_| invalid())?;
            }
            "costSection.enabled" => {
                self.cost_section.enabled =
                    value.trim().parse().map_err(|_| invalid())?;
            }
            "costSection.title" => self.cost_section.title = value.to_owned(),
            "costSection.subtitle" => {
                self.cost_section.subtitle = value.to_owned();
            }
            "costSection.note" => self.cost_section.note = value.to_owned(),
            _ => {
                let block = TextBlock::ALL
                    .into_iter()
                    .find(|b| b.field() == name)
                    .ok_or_else(|| Error::UnknownField(name.to_owned()))?;
                *self.text_block_mut(block) = value.to_owned();
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Returns the editable text of the provided [`TextBlock`].
    #[must_use]
    pub fn text_block(&self, block: TextBlock) -> &str {
        &self.text_blocks[block as usize]
    }

    /// Appends an empty line to the provided [`TextBlock`].
    pub fn add_line(&mut self, block: TextBlock) {
        self.text_block_mut(block).push('\n');
        self.dirty = true;
    }

    /// Returns URLs of the provided [`ImageList`].
    #[must_use]
    pub fn images(&self, list: ImageList) -> &[String] {
        match list {
            ImageList::Images => &self.images,
            ImageList::Gallery => &self.gallery_images,
        }
    }

    /// Sets the URL at the provided `index` of the provided [`ImageList`].
    ///
    /// # Errors
    ///
    /// If there is no such `index` in the [`ImageList`].
    pub fn set_image(
        &mut self,
        list: ImageList,
        index: usize,
        url: impl Into<String>,
    ) -> Result<(), Error> {
        let item = self
            .images_mut(list)
            .get_mut(index)
            .ok_or(Error::UnknownImage(index))?;
        *item = url.into();
        self.dirty = true;
        Ok(())
    }

    /// Appends an empty URL to the provided [`ImageList`].
    pub fn add_image(&mut self, list: ImageList) {
        self.images_mut(list).push(String::new());
        self.dirty = true;
    }

    /// Removes the URL at the provided `index` of the provided [`ImageList`].
    ///
    /// # Errors
    ///
    /// If there is no such `index` in the [`ImageList`].
    pub fn remove_image(
        &mut self,
        list: ImageList,
        index: usize,
    ) -> Result<String, Error> {
        let images = self.images_mut(list);
        if index >= images.len() {
            return Err(Error::UnknownImage(index));
        }
        let removed = images.remove(index);
        self.dirty = true;
        Ok(removed)
    }

    /// Converts this [`Draft`] into a [`Document`] to be written.
    ///
    /// Text blocks are split into trimmed non-empty lines, [`Day`]
    /// descriptions are normalized, and blank image URLs are dropped.
    ///
    /// # Errors
    ///
    /// With the first [`ValidationError`] found.
    pub fn to_document(&self) -> Result<Document, ValidationError> {
        use ValidationError as E;

        let name = package::Name::new(self.name.trim()).ok_or(E::Name)?;
        let slug = package::Slug::new(self.slug.trim()).ok_or(E::Slug)?;
        let description =
            package::Description::new(self.description.trim())
                .ok_or(E::Description)?;
        let price = Price::from_str(&self.price).map_err(|_| E::Price)?;
        let r#type = package::Type::new(self.r#type.trim().to_lowercase())
            .ok_or(E::Type)?;

        let days = u16::try_from(self.days).map_err(|_| E::Duration)?;
        let nights = u16::try_from(self.nights).map_err(|_| E::Duration)?;
        let duration =
            package::Duration::new(days, nights).ok_or(E::Duration)?;

        let rating = Rating::try_from(self.rating).map_err(|_| E::Rating)?;
        let reviews_count =
            u32::try_from(self.reviews_count).map_err(|_| E::ReviewsCount)?;

        let mut itinerary = self
            .itinerary
            .iter()
            .map(|entry| Day {
                description: text::normalize(&entry.day.description),
                ..entry.day.clone()
            })
            .collect::<Vec<_>>();
        itinerary::renumber(&mut itinerary);

        let mut cost_section = self.cost_section.clone();
        cost_section.table.strip_orphans();

        let [inclusions, exclusions, terms, cancellation] =
            self.text_blocks.each_ref().map(|b| text::from_editable(b));

        Ok(Document {
            name,
            slug,
            category: self.category,
            r#type,
            duration,
            price,
            description,
            images: text::non_blank(&self.images),
            gallery_images: text::non_blank(&self.gallery_images),
            inclusions,
            exclusions,
            terms_and_conditions: terms,
            cancellation_policy: cancellation,
            itinerary,
            cost_section,
            rating,
            reviews_count,
            featured: self.featured,
        })
    }

    /// Returns the editable text of the provided [`TextBlock`] for mutation.
    fn text_block_mut(&mut self, block: TextBlock) -> &mut String {
        &mut self.text_blocks[block as usize]
    }

    /// Returns URLs of the provided [`ImageList`] for mutation.
    fn images_mut(&mut self, list: ImageList) -> &mut Vec<String> {
        match list {
            ImageList::Images => &mut self.images,
            ImageList::Gallery => &mut self.gallery_images,
        }
    }
}

impl From<&Document> for Draft {
    fn from(doc: &Document) -> Self {
        let mut draft = Self {
            name: doc.name.to_string(),
            slug: doc.slug.to_string(),
            category: doc.category,
            r#type: doc.r#type.to_string(),
            days: doc.duration.days().into(),
            nights: doc.duration.nights().into(),
            price: doc.price.amount().to_string(),
            description: doc.description.to_string(),
            images: doc.images.clone(),
            gallery_images: doc.gallery_images.clone(),
            text_blocks: [
                text::to_editable(&doc.inclusions),
                text::to_editable(&doc.exclusions),
                text::to_editable(&doc.terms_and_conditions),
                text::to_editable(&doc.cancellation_policy),
            ],
            itinerary: Vec::with_capacity(doc.itinerary.len()),
            last_key: 0,
            form: DayForm::default(),
            editing: None,
            pending_delete: None,
            cost_section: doc.cost_section.clone(),
            rating: doc.rating.as_f64(),
            reviews_count: doc.reviews_count.into(),
            featured: doc.featured,
            dirty: false,
        };
        for day in &doc.itinerary {
            draft.push_entry(day.clone());
        }
        draft.reset_form();
        draft
    }
}

/// Package policy section edited as a single multi-line text.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum TextBlock {
    /// What the price includes.
    Inclusions = 0,

    /// What the price doesn't include.
    Exclusions = 1,

    /// Terms and conditions.
    TermsAndConditions = 2,

    /// Cancellation policy.
    CancellationPolicy = 3,
}

impl TextBlock {
    /// All the [`TextBlock`]s.
    pub const ALL: [Self; 4] = [
        Self::Inclusions,
        Self::Exclusions,
        Self::TermsAndConditions,
        Self::CancellationPolicy,
    ];

    /// Returns the document field name of this [`TextBlock`].
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Inclusions => "inclusions",
            Self::Exclusions => "exclusions",
            Self::TermsAndConditions => "termsAndConditions",
            Self::CancellationPolicy => "cancellationPolicy",
        }
    }
}

/// List of image URLs of a package.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ImageList {
    /// Cover images.
    Images,

    /// Gallery images.
    Gallery,
}

/// Reason a [`Draft`] cannot be written.
#[derive(Clone, Copy, Debug, Display, StdError, Eq, PartialEq)]
pub enum ValidationError {
    /// Name is empty or too long.
    #[display("Name is required")]
    Name,

    /// Slug is empty or malformed.
    #[display("Slug must be lowercase words separated by dashes")]
    Slug,

    /// Description is empty or too long.
    #[display("Description is required")]
    Description,

    /// Price is not a non-negative number.
    #[display("Price must be a non-negative number")]
    Price,

    /// Type is empty or malformed.
    #[display("Type must be a lowercase word")]
    Type,

    /// Duration has no days, or a negative number of nights.
    #[display("Duration must have at least one day and no negative nights")]
    Duration,

    /// Rating is out of range.
    #[display("Rating must be within 0.0..=5.0")]
    Rating,

    /// Number of reviews is negative.
    #[display("Number of reviews must not be negative")]
    ReviewsCount,
}

#[cfg(test)]
mod spec {
    use crate::domain::Package;

    use super::{Draft, Error, ImageList, TextBlock, ValidationError};

    fn goa_getaway() -> Draft {
        Draft::from(&Package::sample("goa-getaway").document)
    }

    #[test]
    fn merges_dotted_fields() {
        let mut draft = goa_getaway();

        draft.set_field("duration.days", "5").unwrap();
        draft.set_field("duration.nights", "4").unwrap();
        draft.set_field("costSection.title", "Costs").unwrap();
        draft.set_field("category", "family-holidays").unwrap();

        assert!(draft.has_unsaved_changes());
        let doc = draft.to_document().unwrap();
        assert_eq!(doc.duration.to_string(), "5D/4N");
        assert_eq!(doc.cost_section.title, "Costs");
        assert_eq!(doc.category.to_string(), "family-holidays");
    }

    #[test]
    fn rejects_unknown_and_unparsable_fields() {
        let mut draft = goa_getaway();

        assert_eq!(
            draft.set_field("bogus", "1"),
            Err(Error::UnknownField("bogus".into())),
        );
        assert!(matches!(
            draft.set_field("duration.days", "many"),
            Err(Error::InvalidValue { .. }),
        ));
        assert!(!draft.has_unsaved_changes());
    }

    #[test]
    fn converts_text_blocks_at_submit_only() {
        let mut draft = goa_getaway();

        draft
            .set_field("inclusions", "  Breakfast \n\n Transfers")
            .unwrap();
        draft.add_line(TextBlock::Inclusions);

        assert_eq!(
            draft.text_block(TextBlock::Inclusions),
            "  Breakfast \n\n Transfers\n",
        );
        assert_eq!(
            draft.to_document().unwrap().inclusions,
            ["Breakfast", "Transfers"],
        );
    }

    #[test]
    fn text_blocks_round_trip() {
        let mut draft = goa_getaway();
        draft.set_field("exclusions", "Visa\n \nFlights\n").unwrap();

        let doc = draft.to_document().unwrap();
        let again = Draft::from(&doc).to_document().unwrap();

        assert_eq!(doc.exclusions, ["Visa", "Flights"]);
        assert_eq!(again.exclusions, doc.exclusions);
    }

    #[test]
    fn drops_blank_images() {
        let mut draft = goa_getaway();

        draft.add_image(ImageList::Images);
        draft.add_image(ImageList::Images);
        draft.add_image(ImageList::Gallery);
        draft.set_image(ImageList::Images, 1, "https://x/1.jpg").unwrap();
        assert_eq!(
            draft.set_image(ImageList::Images, 5, "y"),
            Err(Error::UnknownImage(5)),
        );

        let doc = draft.to_document().unwrap();
        assert_eq!(doc.images, ["https://x/1.jpg"]);
        assert!(doc.gallery_images.is_empty());

        let removed = draft.remove_image(ImageList::Images, 1).unwrap();
        assert_eq!(removed, "https://x/1.jpg");
        assert_eq!(draft.images(ImageList::Images).len(), 1);
    }

    #[test]
    fn validates_required_fields() {
        let mut draft = goa_getaway();
        draft.set_field("name", "  ").unwrap();
        assert_eq!(draft.to_document(), Err(ValidationError::Name));

        let mut draft = goa_getaway();
        draft.set_field("price", "-5").unwrap();
        assert_eq!(draft.to_document(), Err(ValidationError::Price));

        let mut draft = goa_getaway();
        draft.set_field("duration.days", "0").unwrap();
        assert_eq!(draft.to_document(), Err(ValidationError::Duration));

        let mut draft = goa_getaway();
        draft.set_field("duration.nights", "-1").unwrap();
        assert_eq!(draft.to_document(), Err(ValidationError::Duration));

        let mut draft = goa_getaway();
        draft.set_field("description", "").unwrap();
        assert_eq!(draft.to_document(), Err(ValidationError::Description));
    }

    #[test]
    fn keeps_loaded_document_intact() {
        let doc = Package::sample("goa-getaway").document;

        assert_eq!(Draft::from(&doc).to_document().unwrap(), doc);
    }
}
