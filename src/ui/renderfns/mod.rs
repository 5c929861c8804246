pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, FooterInfo, Status};
pub use header::{draw_header, endpoint_label};
pub use utils::{cell_text, truncate};
