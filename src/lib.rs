pub mod config;
pub mod persistence;
pub mod sync;

use persistence::{PreferenceStore, SavedView};

/// Where the map opens when nothing else says otherwise (central England).
pub const DEFAULT_VIEW: SavedView = SavedView {
    zoom: 6.0,
    lat: 53.0,
    lng: -1.6,
};

/// Picks the opening view: an explicit request, else the last saved one,
/// else [`DEFAULT_VIEW`].
pub fn initial_view(store: Option<&PreferenceStore>, requested: Option<SavedView>) -> SavedView {
    requested
        .or_else(|| store.and_then(PreferenceStore::load_view))
        .unwrap_or(DEFAULT_VIEW)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::tests::temp_prefs;

    #[test]
    fn explicit_view_wins_over_saved_one() {
        let store = PreferenceStore::new(temp_prefs());
        let saved = SavedView {
            zoom: 14.0,
            lat: 51.45,
            lng: -2.6,
        };
        store.save_view(&saved);

        assert_eq!(initial_view(Some(&store), None), saved);

        let requested = SavedView {
            zoom: 10.0,
            lat: 55.9,
            lng: -3.2,
        };
        assert_eq!(initial_view(Some(&store), Some(requested)), requested);
        assert_eq!(initial_view(None, None), DEFAULT_VIEW);
    }
}
