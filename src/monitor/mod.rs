pub mod session;
pub mod ticker;
pub mod watchlist;

pub use session::MonitorSession;
pub use ticker::{SharedWatchlist, TickerHandle};
pub use watchlist::default_watchlist;
