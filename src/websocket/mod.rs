pub mod dispatcher;
pub mod handler;

pub use dispatcher::{dispatch, dispatch_text, Reply};
pub use handler::{ws_index, BoardSocket};
