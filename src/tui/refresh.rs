//! Background record fetches and their results.

use crate::fetch_records;

use super::app::App;
use super::event::DataEvent;

/// Starts a refresh: the fetch runs on a tokio task and its result comes
/// back as [`DataEvent::Loaded`]. A refresh already in flight is refused
/// with a notice.
pub fn start_refresh(app: &mut App) {
    let url = match app.table.begin_refresh() {
        Ok(url) => url,
        Err(notice) => {
            app.show(notice);
            return;
        }
    };
    app.status = "Loading...".to_string();

    let tx = app.event_tx.clone();
    let fetcher = app.fetcher.clone();
    tokio::spawn(async move {
        let result = fetch_records(fetcher.as_ref(), &url).await;
        let _ = tx.send(DataEvent::Loaded(result));
    });
}

pub fn handle_data_event(app: &mut App, event: DataEvent) {
    match event {
        DataEvent::Loaded(result) => {
            match app.table.finish_load(result) {
                Ok(count) => {
                    app.status = format!("Loaded {count} chemicals");
                }
                Err(e) => {
                    app.status = "Load failed".to_string();
                    app.show(crate::Notice::error(format!("Error loading data: {e}")));
                }
            }
            app.table.render();
            app.clamp_cursor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::{DATA_URL, MockFetcher, THREE_RECORDS};
    use crate::tui::app::{Popup, tests::test_app};
    use crate::{Error, LoadState};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[test]
    fn loaded_event_replaces_rows() {
        let mut app = test_app();
        let records = serde_json::from_str(THREE_RECORDS).unwrap();
        handle_data_event(&mut app, DataEvent::Loaded(Ok(records)));
        assert_eq!(app.table.rows().len(), 3);
        assert_eq!(app.status, "Loaded 3 chemicals");
        assert_eq!(app.popup(), Popup::None);
    }

    #[test]
    fn failed_event_shows_one_notice_and_keeps_rows() {
        let mut app = test_app();
        let err = Error::Status {
            url: DATA_URL.to_string(),
            status: 500,
        };
        handle_data_event(&mut app, DataEvent::Loaded(Err(err)));
        assert_eq!(app.table.rows().len(), 5);
        assert_eq!(app.popup(), Popup::Notice);
        assert!(app.notice.as_ref().unwrap().message.contains("500"));
    }

    #[test]
    fn loaded_event_closes_confirm_opened_mid_refresh() {
        let mut app = test_app();
        app.table.begin_refresh().unwrap();
        app.table.toggle_row(0);
        app.table.delete_row().unwrap();
        assert_eq!(app.popup(), Popup::Confirm);

        let records = serde_json::from_str(THREE_RECORDS).unwrap();
        handle_data_event(&mut app, DataEvent::Loaded(Ok(records)));

        assert_eq!(app.popup(), Popup::None);
        assert_eq!(app.table.confirm(true), 0);
        assert_eq!(app.table.rows().len(), 3);
    }

    #[tokio::test]
    async fn refresh_round_trip_through_channel() {
        let mut app = test_app();
        let (tx, mut rx) = mpsc::unbounded_channel();
        app.event_tx = tx;
        app.fetcher = Arc::new(MockFetcher::new().with(DATA_URL, 200, THREE_RECORDS));

        start_refresh(&mut app);
        assert!(app.table.is_refreshing());

        start_refresh(&mut app);
        assert_eq!(app.popup(), Popup::Notice);
        app.notice = None;

        let event = rx.recv().await.unwrap();
        handle_data_event(&mut app, event);
        assert_eq!(app.table.load_state(), &LoadState::Loaded(3));
        assert_eq!(app.table.rows().len(), 3);
    }
}
