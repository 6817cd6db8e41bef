pub mod model;
pub mod state;

pub use model::AppListModel;
pub use state::AppListState;
