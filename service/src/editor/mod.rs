//! [`Editor`] of a [`Package`] document.
//!
//! An [`Editor`] keeps a [`Draft`] of a single [`Package`] in sync with its
//! live state until the [`Draft`] is touched. From then on the [`Draft`] is
//! kept as is, and [`Editor::submit()`] writes it back as a whole, silently
//! overwriting whatever was written meanwhile (the last write wins).

mod cost;
pub mod draft;
pub mod itinerary;

use common::operations::{By, Watch};
use derive_more::{Display, Error as StdError, From};
use futures::StreamExt as _;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{update_package, UpdatePackage},
    domain::{
        package::{self, cost as table},
        Package,
    },
    infra::{database, feed},
    query::package::{WatchById, Watching},
    Command, Query,
};

pub use self::{
    draft::{Draft, ImageList, TextBlock, ValidationError},
    itinerary::{DayForm, Entry, Key},
};

/// Editor of a single [`Package`] document.
#[derive(Debug)]
pub struct Editor {
    /// ID of the [`Package`] being edited.
    id: package::Id,

    /// [`State`] of this [`Editor`].
    state: State,

    /// [`Draft`] being edited, once loaded.
    draft: Option<Draft>,

    /// Last [`Notice`] not shown yet.
    notice: Option<Notice>,
}

impl Editor {
    /// Creates a new [`Editor`] of the [`Package`] with the provided `id`,
    /// waiting for its state to be [`Editor::apply()`]ed.
    #[must_use]
    pub fn new(id: package::Id) -> Self {
        Self {
            id,
            state: State::Loading,
            draft: None,
            notice: None,
        }
    }

    /// Opens a new [`Editor`] of the [`Package`] with the provided `id`,
    /// subscribing to its live state.
    ///
    /// The first emission is applied already. Further ones are to be
    /// [`Editor::sync()`]ed from the returned [`Watching`] stream, and
    /// dropping it unsubscribes.
    ///
    /// # Errors
    ///
    /// If the subscription cannot be opened.
    pub async fn open<S>(
        service: &S,
        id: package::Id,
    ) -> Result<(Self, Watching), Traced<database::Error>>
    where
        S: Query<WatchById, Ok = Watching, Err = Traced<database::Error>>,
    {
        let mut watching = service
            .execute(Watch(By::new(id)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut this = Self::new(id);
        if let Some(first) = watching.next().await {
            this.apply(first);
        }
        Ok((this, watching))
    }

    /// Waits for the next emission of the provided [`Watching`] stream and
    /// applies it.
    ///
    /// Returns `false` once the stream is over.
    pub async fn sync(&mut self, watching: &mut Watching) -> bool {
        match watching.next().await {
            Some(emission) => {
                self.apply(emission);
                true
            }
            None => false,
        }
    }

    /// Applies the provided emission of the live [`Package`] state.
    ///
    /// The [`Draft`] is replaced only while it has no unsaved changes.
    pub fn apply(&mut self, emission: Result<Option<Package>, feed::Error>) {
        let pkg = match emission {
            Ok(pkg) => pkg,
            Err(e) => {
                log::warn!("`Package(id: {})` failed to load: {e}", self.id);
                self.state = State::Failed(e);
                self.notice = Some(Notice::failure("Failed to load package"));
                return;
            }
        };

        if self.has_unsaved_changes() {
            log::debug!(
                "`Package(id: {})` changed remotely, keeping local draft",
                self.id,
            );
            return;
        }

        match pkg {
            Some(pkg) if pkg.id == self.id => {
                self.draft = Some(Draft::from(&pkg.document));
                self.state = State::Ready;
            }
            Some(_) => {}
            None => {
                self.draft = None;
                self.state = State::NotFound;
                self.notice = Some(Notice::failure("Package not found"));
            }
        }
    }

    /// Returns ID of the [`Package`] being edited.
    #[must_use]
    pub fn id(&self) -> package::Id {
        self.id
    }

    /// Returns the current [`State`] of this [`Editor`].
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the [`Draft`] being edited, if loaded.
    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Returns the [`Draft`] being edited for mutation.
    ///
    /// # Errors
    ///
    /// If no [`Draft`] is loaded.
    pub fn draft_mut(&mut self) -> Result<&mut Draft, Error> {
        self.draft.as_mut().ok_or(Error::NotLoaded)
    }

    /// Indicates whether the [`Draft`] has changes not written yet.
    ///
    /// Leaving an [`Editor`] with unsaved changes should be confirmed.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.draft.as_ref().is_some_and(Draft::has_unsaved_changes)
    }

    /// Takes the last [`Notice`] to be shown, if any.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Writes the [`Draft`] as a whole with the provided `service`.
    ///
    /// Does nothing if there are no unsaved changes. On failure the [`Draft`]
    /// is left untouched, so submitting can be retried. Either way a
    /// [`Notice`] is left.
    ///
    /// # Errors
    ///
    /// If the [`Draft`] is invalid or cannot be written.
    pub async fn submit<S>(
        &mut self,
        service: &S,
    ) -> Result<Outcome, SubmitError>
    where
        S: Command<
            UpdatePackage,
            Ok = Package,
            Err = Traced<update_package::ExecutionError>,
        >,
    {
        let draft = self.draft.as_mut().ok_or(SubmitError::NotLoaded)?;
        if !draft.has_unsaved_changes() {
            return Ok(Outcome::Unchanged);
        }

        let document = match draft.to_document() {
            Ok(doc) => doc,
            Err(e) => {
                self.notice = Some(Notice::failure(e.to_string()));
                return Err(SubmitError::Invalid(e));
            }
        };

        let cmd = UpdatePackage {
            id: self.id,
            document,
        };
        match service.execute(cmd).await {
            Ok(pkg) => {
                draft.dirty = false;
                log::info!("`Package(id: {})` submitted", self.id);
                self.notice =
                    Some(Notice::success("Package updated successfully"));
                Ok(Outcome::Saved(pkg))
            }
            Err(e) => {
                log::warn!("`Package(id: {})` submit failed: {e}", self.id);
                self.notice = Some(Notice::failure("Failed to update package"));
                Err(SubmitError::Write(e))
            }
        }
    }
}

/// State of an [`Editor`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Waiting for the first emission of the live state.
    Loading,

    /// [`Draft`] is loaded.
    Ready,

    /// [`Package`] doesn't exist.
    NotFound,

    /// Live state failed to load.
    Failed(feed::Error),
}

/// Successful [`Editor::submit()`] outcome.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// There was nothing to write.
    Unchanged,

    /// [`Draft`] was written as the provided [`Package`].
    Saved(Package),
}

/// Transient notification about an [`Editor`] operation result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    /// Kind of this [`Notice`].
    pub kind: NoticeKind,

    /// Human-readable message.
    pub message: String,
}

impl Notice {
    /// Creates a new [`NoticeKind::Success`] [`Notice`].
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// Creates a new [`NoticeKind::Failure`] [`Notice`].
    fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }
}

/// Kind of a [`Notice`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    /// Operation succeeded.
    Success,

    /// Operation failed.
    Failure,
}

/// Error of addressing a [`Draft`] part.
#[derive(Clone, Debug, Display, StdError, Eq, From, PartialEq)]
pub enum Error {
    /// No [`Draft`] is loaded.
    #[display("Package is not loaded")]
    #[from(ignore)]
    NotLoaded,

    /// There is no field with the provided name.
    #[display("Unknown field `{_0}`")]
    #[from(ignore)]
    UnknownField(#[error(not(source))] String),

    /// Value cannot be parsed for the field.
    #[display("Invalid value `{value}` of `{field}` field")]
    #[from(ignore)]
    InvalidValue {
        /// Name of the field.
        field: String,

        /// Rejected value.
        value: String,
    },

    /// There is no image at the provided index.
    #[display("No image at {_0} index")]
    #[from(ignore)]
    UnknownImage(#[error(not(source))] usize),

    /// There is no [`package::Day`] at the provided index.
    #[display("No day at {_0} index")]
    #[from(ignore)]
    UnknownDay(#[error(not(source))] usize),

    /// There is no itinerary [`Entry`] with the provided [`Key`].
    #[display("No itinerary entry `{_0}`")]
    #[from(ignore)]
    UnknownEntry(#[error(not(source))] Key),

    /// No [`package::Day`] is being edited.
    #[display("No day is being edited")]
    #[from(ignore)]
    NotEditing,

    /// No [`package::Day`] waits for deletion confirmation.
    #[display("No day is pending deletion")]
    #[from(ignore)]
    NothingPending,

    /// Cost table has no such part.
    #[display("{_0}")]
    Table(table::Error),
}

/// Error of [`Editor::submit()`].
#[derive(Debug, Display, StdError)]
pub enum SubmitError {
    /// No [`Draft`] is loaded.
    #[display("Package is not loaded")]
    NotLoaded,

    /// [`Draft`] doesn't pass validation.
    #[display("Invalid package: {_0}")]
    Invalid(ValidationError),

    /// [`Draft`] was rejected when written.
    #[display("Failed to update package: {_0}")]
    Write(Traced<update_package::ExecutionError>),
}

#[cfg(test)]
mod spec {
    use tracerr::Traced;

    use crate::{
        command::{update_package::ExecutionError, UpdatePackage},
        domain::Package,
        infra::{database::memory::Memory, feed},
        Command, Service,
    };

    use super::{Editor, NoticeKind, Outcome, State, SubmitError};

    /// [`Command`] rejecting every [`UpdatePackage`].
    struct Rejecting;

    impl Command<UpdatePackage> for Rejecting {
        type Ok = Package;
        type Err = Traced<ExecutionError>;

        async fn execute(
            &self,
            cmd: UpdatePackage,
        ) -> Result<Self::Ok, Self::Err> {
            Err(tracerr::new!(ExecutionError::PackageNotExists(cmd.id)))
        }
    }

    fn loaded(pkg: &Package) -> Editor {
        let mut editor = Editor::new(pkg.id);
        editor.apply(Ok(Some(pkg.clone())));
        editor
    }

    #[test]
    fn follows_live_state_until_touched() {
        let pkg = Package::sample("goa-getaway");
        let mut editor = Editor::new(pkg.id);
        assert_eq!(editor.state(), State::Loading);

        editor.apply(Ok(Some(pkg.clone())));
        assert_eq!(editor.state(), State::Ready);

        let mut remote = pkg.clone();
        remote.document.featured = true;
        editor.apply(Ok(Some(remote.clone())));
        assert!(editor.draft().unwrap().to_document().unwrap().featured);

        let draft = editor.draft_mut().unwrap();
        draft.set_field("name", "Goa Escape").unwrap();
        remote.document.featured = false;
        editor.apply(Ok(Some(remote)));

        let doc = editor.draft().unwrap().to_document().unwrap();
        assert_eq!(doc.name.to_string(), "Goa Escape");
        assert!(doc.featured);
    }

    #[test]
    fn reports_missing_package() {
        let mut editor = Editor::new(Package::sample("goa").id);

        editor.apply(Ok(None));

        assert_eq!(editor.state(), State::NotFound);
        assert!(editor.draft().is_none());
        assert_eq!(editor.take_notice().unwrap().kind, NoticeKind::Failure);
    }

    #[test]
    fn fails_on_subscription_error() {
        let pkg = Package::sample("goa-getaway");
        let mut editor = loaded(&pkg);

        editor.apply(Err(feed::Error::Lagged(3)));

        assert_eq!(editor.state(), State::Failed(feed::Error::Lagged(3)));
        assert!(editor.draft().is_some());
    }

    #[tokio::test]
    async fn skips_submit_without_changes() {
        let pkg = Package::sample("goa-getaway");
        let mut editor = loaded(&pkg);

        let outcome = editor.submit(&Rejecting).await.unwrap();

        assert!(matches!(outcome, Outcome::Unchanged));
        assert!(editor.take_notice().is_none());
    }

    #[tokio::test]
    async fn keeps_draft_on_failed_submit() {
        let pkg = Package::sample("goa-getaway");
        let mut editor = loaded(&pkg);
        let draft = editor.draft_mut().unwrap();
        draft.set_field("inclusions", "Breakfast\nDinner").unwrap();
        draft.add_day();
        let before = editor.draft().unwrap().to_document().unwrap();

        let err = editor.submit(&Rejecting).await.unwrap_err();

        assert!(matches!(err, SubmitError::Write(_)));
        assert!(editor.has_unsaved_changes());
        assert_eq!(editor.draft().unwrap().to_document().unwrap(), before);
        assert_eq!(editor.take_notice().unwrap().kind, NoticeKind::Failure);
    }

    #[tokio::test]
    async fn keeps_draft_on_invalid_submit() {
        let pkg = Package::sample("goa-getaway");
        let mut editor = loaded(&pkg);
        editor.draft_mut().unwrap().set_field("price", "-1").unwrap();

        let err = editor.submit(&Rejecting).await.unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(_)));
        assert!(editor.has_unsaved_changes());
    }

    #[tokio::test]
    async fn submits_whole_document() {
        let pkg = Package::sample("goa-getaway");
        let db = Memory::with_packages([pkg.clone()]);
        let service = Service::for_tests(db.clone());
        let (mut editor, mut watching) =
            Editor::open(&service, pkg.id).await.unwrap();
        assert_eq!(editor.state(), State::Ready);

        let draft = editor.draft_mut().unwrap();
        draft.set_field("duration.days", "4").unwrap();
        draft.set_day_field("title", "Arrival").unwrap();
        draft.add_day();
        let column = draft.add_column(Some("Item"));
        let row = draft.add_row();
        draft.set_cell(&row, &column, "Hotel").unwrap();

        let outcome = editor.submit(&service).await.unwrap();

        assert!(matches!(outcome, Outcome::Saved(_)));
        assert!(!editor.has_unsaved_changes());
        assert_eq!(editor.take_notice().unwrap().kind, NoticeKind::Success);
        let stored = db.packages()[0].document.clone();
        assert_eq!(stored.duration.days(), 4);
        assert_eq!(stored.itinerary[0].title, "Arrival");
        assert_eq!(
            stored.cost_section.table.cell(&row, &column),
            Some("Hotel"),
        );

        assert!(editor.sync(&mut watching).await);
        assert_eq!(editor.draft().unwrap().to_document().unwrap(), stored);
    }
}
