//! Table controller: owns the record store and implements every table action.
//!
//! All actions are synchronous mutations of the store followed by a full
//! re-render of the table view. Only loading suspends, and it is split into
//! [`TableController::begin_refresh`] and [`TableController::finish_load`] so
//! a UI can run the fetch elsewhere and apply the result on its own thread.

use crate::error::Result;
use crate::form::RecordForm;
use crate::record::{ChemicalRecord, Column, Field};
use crate::source::{Fetcher, fetch_records};
use crate::store::{MoveDirection, RecordStore};

pub const SELECT_ONE_TO_MOVE: &str = "Please select exactly one row to move.";
pub const SELECT_TO_DELETE: &str = "Please select at least one row to delete.";
pub const CONFIRM_DELETE: &str = "Are you sure you want to delete the selected row(s)?";
pub const SAVED: &str = "Data saved successfully!";
pub const REFRESH_IN_FLIGHT: &str = "A refresh is already in progress.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user. Refused actions and load failures produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Progress of the most recent load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    InFlight,
    Loaded(usize),
    Failed(String),
}

/// The add or edit view currently open over the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Add(RecordForm),
    Edit(RecordForm),
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: u64,
    /// Cell text in [`Field::ALL`] order.
    pub cells: Vec<String>,
}

pub struct TableController {
    url: String,
    store: RecordStore,
    sort: [SortDirection; Column::COUNT],
    rows: Vec<TableRow>,
    selected: Vec<bool>,
    overlay: Overlay,
    pending_delete: Option<Vec<usize>>,
    load_state: LoadState,
}

impl TableController {
    /// Creates an empty controller that loads from `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            store: RecordStore::new(),
            sort: [SortDirection::Ascending; Column::COUNT],
            rows: Vec::new(),
            selected: Vec::new(),
            overlay: Overlay::None,
            pending_delete: None,
            load_state: LoadState::Idle,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn records(&self) -> &[ChemicalRecord] {
        self.store.records()
    }

    #[must_use]
    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    #[must_use]
    pub const fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub const fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    #[must_use]
    pub const fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.load_state == LoadState::InFlight
    }

    #[must_use]
    pub fn sort_direction(&self, column: usize) -> Option<SortDirection> {
        self.sort.get(column).copied()
    }

    /// Loads once and renders. Any load failure is logged and returned as a
    /// single error notice; it never propagates further.
    pub async fn initialize(&mut self, fetcher: &dyn Fetcher) -> Option<Notice> {
        let result = self.load(fetcher).await;
        self.render();
        result
            .err()
            .map(|e| Notice::error(format!("Failed to initialize the application: {e}")))
    }

    /// Fetches the record document and replaces the sequence with it.
    ///
    /// # Errors
    ///
    /// Returns the load failure; the sequence is left untouched.
    pub async fn load(&mut self, fetcher: &dyn Fetcher) -> Result<usize> {
        self.load_state = LoadState::InFlight;
        let result = fetch_records(fetcher, &self.url).await;
        self.finish_load(result)
    }

    /// [`TableController::load`] followed by [`TableController::render`].
    /// Returns only once the new rows are rendered.
    ///
    /// # Errors
    ///
    /// Returns the load failure; the table is re-rendered from the unchanged
    /// sequence.
    pub async fn refresh(&mut self, fetcher: &dyn Fetcher) -> Result<usize> {
        self.discard_transient();
        let result = self.load(fetcher).await;
        self.render();
        result
    }

    /// Marks a refresh as in flight and returns the URL to fetch. Open
    /// overlays and pending confirmations are discarded.
    ///
    /// # Errors
    ///
    /// Returns a notice if a refresh is already in flight.
    pub fn begin_refresh(&mut self) -> std::result::Result<String, Notice> {
        if self.is_refreshing() {
            return Err(Notice::warning(REFRESH_IN_FLIGHT));
        }
        self.discard_transient();
        self.load_state = LoadState::InFlight;
        Ok(self.url.clone())
    }

    /// Applies the result of a fetch started with
    /// [`TableController::begin_refresh`] or [`TableController::load`].
    ///
    /// # Errors
    ///
    /// Returns the load failure after recording it; the sequence is left
    /// untouched.
    ///
    /// A successful load discards any open overlay or pending confirmation,
    /// since they refer to rows of the replaced sequence.
    pub fn finish_load(&mut self, result: Result<Vec<ChemicalRecord>>) -> Result<usize> {
        match result {
            Ok(records) => {
                let count = records.len();
                self.store.replace_all(records);
                self.discard_transient();
                self.load_state = LoadState::Loaded(count);
                log::info!("Data loaded successfully: {count} chemicals");
                Ok(count)
            }
            Err(e) => {
                log::error!("Error loading data: {e}");
                self.load_state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Rebuilds the table view from the sequence. Every selection is cleared.
    pub fn render(&mut self) {
        log::debug!("Rendering table with {} chemicals", self.store.len());
        self.rows = self
            .store
            .records()
            .iter()
            .map(|record| TableRow {
                id: record.id,
                cells: Field::ALL
                    .iter()
                    .map(|&field| record.value(field).to_string())
                    .collect(),
            })
            .collect();
        self.selected = vec![false; self.rows.len()];
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    /// Indices of the selected rows, ascending.
    #[must_use]
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selected
            .iter()
            .enumerate()
            .filter_map(|(i, &checked)| checked.then_some(i))
            .collect()
    }

    /// Flips one row's checkbox.
    pub fn toggle_row(&mut self, index: usize) {
        if let Some(checked) = self.selected.get_mut(index) {
            *checked = !*checked;
        }
    }

    /// Sets every row's checkbox.
    pub fn select_all(&mut self, checked: bool) {
        self.selected.fill(checked);
    }

    /// Opens the creation view with a blank record.
    pub fn add_row(&mut self) {
        let blank = ChemicalRecord::blank(self.store.next_id());
        self.overlay = Overlay::Add(RecordForm::from_record(&blank));
    }

    /// Validates `form` and appends the new record.
    ///
    /// # Errors
    ///
    /// Returns a warning notice if validation fails; nothing is added.
    pub fn save_add(&mut self, form: &RecordForm) -> std::result::Result<(), Notice> {
        let record = form
            .validate_new(self.store.next_id())
            .map_err(|e| Notice::warning(e.to_string()))?;
        log::debug!("Added chemical {} ({})", record.id, record.chemical_name);
        self.store.push(record);
        self.render();
        self.close_add();
        Ok(())
    }

    /// Opens the edit view for the row at `index`. Returns `false` if there
    /// is no such row.
    pub fn open_edit(&mut self, index: usize) -> bool {
        match self.store.get(index) {
            Some(record) => {
                self.overlay = Overlay::Edit(RecordForm::from_record(record));
                true
            }
            None => false,
        }
    }

    /// Replaces the record with the form's id, without validation. Returns
    /// `false`, leaving everything as is, if no record has that id.
    pub fn save_edit(&mut self, form: &RecordForm) -> bool {
        if !self.store.replace_by_id(form.to_record()) {
            return false;
        }
        self.render();
        if matches!(self.overlay, Overlay::Edit(_)) {
            self.overlay = Overlay::None;
        }
        true
    }

    /// Saves whichever view is open.
    ///
    /// # Errors
    ///
    /// Returns the validation notice of [`TableController::save_add`].
    pub fn submit_overlay(&mut self) -> std::result::Result<(), Notice> {
        match self.overlay.clone() {
            Overlay::None => Ok(()),
            Overlay::Add(form) => self.save_add(&form),
            Overlay::Edit(form) => {
                self.save_edit(&form);
                Ok(())
            }
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    fn close_add(&mut self) {
        if matches!(self.overlay, Overlay::Add(_)) {
            self.overlay = Overlay::None;
        }
    }

    /// Asks for confirmation to delete the selected rows.
    ///
    /// # Errors
    ///
    /// Returns a warning notice if no row is selected.
    pub fn delete_row(&mut self) -> std::result::Result<(), Notice> {
        let indices = self.selected_indices();
        if indices.is_empty() {
            return Err(Notice::warning(SELECT_TO_DELETE));
        }
        self.pending_delete = Some(indices);
        Ok(())
    }

    /// The question awaiting a yes/no answer, if any.
    #[must_use]
    pub const fn pending_confirmation(&self) -> Option<&'static str> {
        if self.pending_delete.is_some() {
            Some(CONFIRM_DELETE)
        } else {
            None
        }
    }

    /// Answers the pending confirmation. On yes the rows selected at the time
    /// of the request are removed. Returns how many rows were removed.
    pub fn confirm(&mut self, yes: bool) -> usize {
        let Some(indices) = self.pending_delete.take() else {
            return 0;
        };
        if !yes {
            return 0;
        }
        let removed = self.store.remove_indices(&indices);
        log::debug!("Deleted {removed} chemicals");
        self.render();
        removed
    }

    /// Swaps the single selected row with its neighbour. Returns the row's
    /// new index, or `None` at the boundary.
    ///
    /// # Errors
    ///
    /// Returns a warning notice unless exactly one row is selected.
    pub fn move_row(
        &mut self,
        direction: MoveDirection,
    ) -> std::result::Result<Option<usize>, Notice> {
        let indices = self.selected_indices();
        let &[index] = indices.as_slice() else {
            return Err(Notice::warning(SELECT_ONE_TO_MOVE));
        };
        let moved = self.store.move_record(index, direction);
        self.render();
        Ok(moved)
    }

    /// Toggles the sort direction of the column at `column` and reorders the
    /// sequence by its field. The selection column and unknown positions are
    /// ignored. Returns the direction applied.
    pub fn sort_table(&mut self, column: usize) -> Option<SortDirection> {
        let field = Column::at(column)?.field()?;
        let direction = self.sort[column].toggled();
        self.sort[column] = direction;
        self.store.sort_by(field, direction == SortDirection::Descending);
        self.render();
        Some(direction)
    }

    /// Acknowledges a save. Nothing is written anywhere.
    pub fn save(&self) -> Notice {
        log::info!("Saving data: {} chemicals", self.store.len());
        if log::log_enabled!(log::Level::Debug)
            && let Ok(json) = serde_json::to_string(self.store.records())
        {
            log::debug!("{json}");
        }
        Notice::info(SAVED)
    }

    fn discard_transient(&mut self) {
        self.overlay = Overlay::None;
        self.pending_delete = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::source::tests::{DATA_URL, MockFetcher, THREE_RECORDS};
    use crate::store::tests::{five, record};

    fn loaded(records: Vec<ChemicalRecord>) -> TableController {
        let mut controller = TableController::new(DATA_URL);
        controller.finish_load(Ok(records)).unwrap();
        controller.render();
        controller
    }

    fn ids(controller: &TableController) -> Vec<u64> {
        controller.records().iter().map(|r| r.id).collect()
    }

    fn acetone_form(controller: &TableController) -> RecordForm {
        let Overlay::Add(form) = controller.overlay() else {
            panic!("expected add overlay, got {:?}", controller.overlay());
        };
        form.clone()
            .with(Field::ChemicalName, "Acetone")
            .with(Field::Vendor, "X")
            .with(Field::Density, "0.79")
            .with(Field::Viscosity, "1")
            .with(Field::Packaging, "Drum")
            .with(Field::PackSize, "200")
            .with(Field::Unit, "L")
            .with(Field::Quantity, "5")
    }

    #[tokio::test]
    async fn load_renders_one_row_per_record() {
        let fetcher = MockFetcher::new().with(DATA_URL, 200, THREE_RECORDS);
        let mut controller = TableController::new(DATA_URL);

        assert!(controller.initialize(&fetcher).await.is_none());
        assert_eq!(controller.records().len(), 3);
        assert_eq!(controller.rows().len(), 3);
        assert_eq!(controller.rows()[0].cells[0], "Ammonium Persulfate");
        assert_eq!(controller.rows()[2].cells[5], "75");
        assert_eq!(controller.load_state(), &LoadState::Loaded(3));
    }

    #[tokio::test]
    async fn failed_initialize_yields_one_notice() {
        let fetcher = MockFetcher::new().with(DATA_URL, 500, "");
        let mut controller = TableController::new(DATA_URL);

        let notice = controller.initialize(&fetcher).await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("500"));
        assert!(controller.records().is_empty());
        assert!(controller.rows().is_empty());
        assert!(matches!(controller.load_state(), LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_existing_records() {
        let fetcher = MockFetcher::new().with(DATA_URL, 200, THREE_RECORDS);
        let mut controller = TableController::new(DATA_URL);
        controller.refresh(&fetcher).await.unwrap();

        fetcher.set(DATA_URL, 503, "");
        assert!(controller.refresh(&fetcher).await.is_err());
        assert_eq!(controller.records().len(), 3);
        assert_eq!(controller.rows().len(), 3);
    }

    #[tokio::test]
    async fn unreachable_source_leaves_store_empty() {
        let fetcher = MockFetcher::new();
        let mut controller = TableController::new(DATA_URL);
        assert!(controller.load(&fetcher).await.is_err());
        assert!(controller.records().is_empty());
    }

    #[test]
    fn refresh_signals_in_flight_until_finished() {
        let mut controller = loaded(five());
        controller.add_row();

        let url = controller.begin_refresh().unwrap();
        assert_eq!(url, DATA_URL);
        assert!(controller.is_refreshing());
        assert_eq!(controller.overlay(), &Overlay::None);
        assert_eq!(
            controller.begin_refresh().unwrap_err().message,
            REFRESH_IN_FLIGHT
        );

        controller.finish_load(Ok(vec![record(9, "Xylene", 0.86)])).unwrap();
        controller.render();
        assert!(!controller.is_refreshing());
        assert_eq!(ids(&controller), vec![9]);
    }

    #[test]
    fn load_during_pending_delete_drops_the_request() {
        let mut controller = loaded(five());
        controller.begin_refresh().unwrap();
        controller.toggle_row(0);
        controller.delete_row().unwrap();
        assert!(controller.pending_confirmation().is_some());

        controller
            .finish_load(Ok(vec![record(9, "Xylene", 0.86), record(10, "Toluene", 0.87)]))
            .unwrap();
        controller.render();

        assert_eq!(controller.pending_confirmation(), None);
        assert_eq!(controller.confirm(true), 0);
        assert_eq!(ids(&controller), vec![9, 10]);
    }

    #[test]
    fn load_during_open_edit_closes_the_overlay() {
        let mut controller = loaded(five());
        controller.begin_refresh().unwrap();
        assert!(controller.open_edit(0));

        controller.finish_load(Ok(vec![record(1, "Xylene", 0.86)])).unwrap();
        controller.render();

        assert_eq!(controller.overlay(), &Overlay::None);
        assert_eq!(controller.submit_overlay(), Ok(()));
        assert_eq!(controller.records()[0].chemical_name, "Xylene");
    }

    #[test]
    fn failed_load_keeps_pending_delete() {
        let mut controller = loaded(five());
        controller.begin_refresh().unwrap();
        controller.toggle_row(4);
        controller.delete_row().unwrap();

        let err = Error::Status {
            url: DATA_URL.to_string(),
            status: 500,
        };
        assert!(controller.finish_load(Err(err)).is_err());
        assert!(controller.pending_confirmation().is_some());
        assert_eq!(controller.confirm(true), 1);
        assert_eq!(ids(&controller), vec![1, 2, 3, 4]);
    }

    #[test]
    fn save_add_appends_one_record() {
        let mut controller = loaded(five());
        controller.add_row();
        let form = acetone_form(&controller);

        controller.save_add(&form).unwrap();
        assert_eq!(controller.records().len(), 6);
        assert_eq!(controller.rows().len(), 6);
        assert_eq!(controller.records()[5].chemical_name, "Acetone");
        assert_eq!(controller.records()[5].id, 6);
        assert_eq!(controller.overlay(), &Overlay::None);
    }

    #[test]
    fn save_add_rejects_zero_density() {
        let mut controller = loaded(five());
        controller.add_row();
        let form = acetone_form(&controller).with(Field::Density, "0");

        let notice = controller.save_add(&form).unwrap_err();
        assert_eq!(notice.message, crate::form::VALIDATION_MESSAGE);
        assert_eq!(controller.records().len(), 5);
        assert!(matches!(controller.overlay(), Overlay::Add(_)));
    }

    #[test]
    fn add_after_delete_gets_fresh_id() {
        let mut controller = loaded(five());
        controller.toggle_row(4);
        controller.delete_row().unwrap();
        controller.confirm(true);

        controller.add_row();
        let form = acetone_form(&controller);
        controller.save_add(&form).unwrap();
        assert_eq!(ids(&controller), vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn edit_replaces_in_place_without_validation() {
        let mut controller = loaded(five());
        assert!(controller.open_edit(1));
        let Overlay::Edit(form) = controller.overlay().clone() else {
            panic!("expected edit overlay");
        };
        assert_eq!(form.get(Field::ChemicalName), "Benzene");

        let form = form.with(Field::ChemicalName, "").with(Field::Density, "0");
        *controller.overlay_mut() = Overlay::Edit(form);
        controller.submit_overlay().unwrap();
        assert_eq!(controller.records()[1].chemical_name, "");
        assert!(controller.records()[1].density.abs() < f64::EPSILON);
        assert_eq!(controller.records().len(), 5);
        assert_eq!(controller.overlay(), &Overlay::None);
    }

    #[test]
    fn edit_with_unknown_id_is_dropped() {
        let mut controller = loaded(five());
        let form = RecordForm::from_record(&record(42, "Ghost", 1.0));
        assert!(!controller.save_edit(&form));
        assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn open_edit_out_of_range() {
        let mut controller = loaded(five());
        assert!(!controller.open_edit(5));
        assert_eq!(controller.overlay(), &Overlay::None);
    }

    #[test]
    fn delete_requires_selection() {
        let mut controller = loaded(five());
        let notice = controller.delete_row().unwrap_err();
        assert_eq!(notice.message, SELECT_TO_DELETE);
        assert_eq!(controller.pending_confirmation(), None);
    }

    #[test]
    fn delete_only_after_confirmation() {
        let mut controller = loaded(five());
        controller.toggle_row(1);
        controller.toggle_row(3);

        controller.delete_row().unwrap();
        assert_eq!(controller.pending_confirmation(), Some(CONFIRM_DELETE));
        assert_eq!(controller.records().len(), 5);

        assert_eq!(controller.confirm(true), 2);
        assert_eq!(ids(&controller), vec![1, 3, 5]);
        assert_eq!(controller.pending_confirmation(), None);
    }

    #[test]
    fn declined_delete_keeps_rows() {
        let mut controller = loaded(five());
        controller.select_all(true);
        controller.delete_row().unwrap();
        assert_eq!(controller.confirm(false), 0);
        assert_eq!(controller.records().len(), 5);
    }

    #[test]
    fn move_requires_exactly_one_selected() {
        let mut controller = loaded(five());
        assert_eq!(
            controller.move_row(MoveDirection::Up).unwrap_err().message,
            SELECT_ONE_TO_MOVE
        );
        controller.toggle_row(1);
        controller.toggle_row(2);
        assert!(controller.move_row(MoveDirection::Down).is_err());
        assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn move_at_boundaries_is_noop() {
        let mut controller = loaded(five());
        controller.toggle_row(0);
        assert_eq!(controller.move_row(MoveDirection::Up), Ok(None));
        controller.toggle_row(4);
        assert_eq!(controller.move_row(MoveDirection::Down), Ok(None));
        assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn move_swaps_with_neighbour() {
        let mut controller = loaded(five());
        controller.toggle_row(2);
        assert_eq!(controller.move_row(MoveDirection::Up), Ok(Some(1)));
        assert_eq!(ids(&controller), vec![1, 3, 2, 4, 5]);
        assert!(controller.selected_indices().is_empty());
    }

    #[test]
    fn sort_toggles_direction() {
        let mut controller = loaded(five());
        assert_eq!(controller.sort_table(3), Some(SortDirection::Descending));
        assert_eq!(ids(&controller), vec![3, 2, 1, 5, 4]);
        assert_eq!(controller.sort_table(3), Some(SortDirection::Ascending));
        assert_eq!(ids(&controller), vec![4, 5, 1, 2, 3]);
        assert_eq!(controller.sort_direction(3), Some(SortDirection::Ascending));
    }

    #[test]
    fn sort_ignores_selection_column() {
        let mut controller = loaded(five());
        assert_eq!(controller.sort_table(0), None);
        assert_eq!(controller.sort_table(Column::COUNT), None);
        assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn select_all_and_toggle() {
        let mut controller = loaded(five());
        controller.select_all(true);
        assert_eq!(controller.selected_indices(), vec![0, 1, 2, 3, 4]);
        controller.toggle_row(2);
        assert!(!controller.is_selected(2));
        controller.select_all(false);
        assert!(controller.selected_indices().is_empty());
    }

    #[test]
    fn save_only_acknowledges() {
        let controller = loaded(five());
        assert_eq!(controller.save(), Notice::info(SAVED));
        assert_eq!(controller.records().len(), 5);
    }
}
